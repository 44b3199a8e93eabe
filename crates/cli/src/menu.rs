//! Line-based console menu driving a [`RegistryService`].
//!
//! Generic over input/output so sessions can be scripted in tests. End of
//! input behaves like choosing "exit".

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use anyhow::Context;

use revive_auth::{Permission, Registration, Role};
use revive_core::DomainError;
use revive_infra::{PersistenceGateway, RegistryService, ServiceError};
use revive_inventory::{ItemRecord, ItemType};

enum Flow {
    Continue,
    Exit,
}

pub struct Menu<R, W, G> {
    service: RegistryService<G>,
    input: R,
    output: W,
}

impl<R, W, G> Menu<R, W, G>
where
    R: BufRead,
    W: Write,
    G: PersistenceGateway,
{
    pub fn new(service: RegistryService<G>, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    pub fn service(&self) -> &RegistryService<G> {
        &self.service
    }

    pub fn into_parts(self) -> (RegistryService<G>, W) {
        (self.service, self.output)
    }

    /// Run until the user exits or input ends, then save.
    ///
    /// Returns an error only for fatal conditions (persistence or console IO).
    pub fn run(&mut self) -> anyhow::Result<()> {
        writeln!(self.output, "Welcome to revive, the item registry.")?;

        loop {
            let flow = match self.service.session().role() {
                None => self.main_menu()?,
                Some(Role::Admin) => self.admin_menu()?,
                Some(Role::User) => self.user_menu()?,
            };
            if let Flow::Exit = flow {
                break;
            }
        }

        self.service
            .shutdown()
            .context("failed to save data on exit")?;
        writeln!(self.output, "Data saved. Goodbye.")?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Menus
    // ─────────────────────────────────────────────────────────────────────────

    fn main_menu(&mut self) -> anyhow::Result<Flow> {
        let bootstrap = self.service.needs_bootstrap();

        writeln!(self.output)?;
        writeln!(self.output, "1. Register")?;
        writeln!(self.output, "2. Log in")?;
        if bootstrap {
            writeln!(self.output, "3. Create initial administrator")?;
        }
        writeln!(self.output, "0. Exit")?;

        let Some(choice) = self.prompt("Choose an option")? else {
            return Ok(Flow::Exit);
        };

        match choice.as_str() {
            "1" => {
                let Some(registration) = self.prompt_registration()? else {
                    return Ok(Flow::Exit);
                };
                if report(&mut self.output, self.service.register(registration))?.is_some() {
                    writeln!(
                        self.output,
                        "Registration received. An administrator must approve your account."
                    )?;
                }
            }
            "2" => return self.login(),
            "3" if bootstrap => {
                let Some(registration) = self.prompt_registration()? else {
                    return Ok(Flow::Exit);
                };
                if report(&mut self.output, self.service.bootstrap_admin(registration))?.is_some() {
                    writeln!(self.output, "Administrator created. You can now log in.")?;
                }
            }
            "0" => return Ok(Flow::Exit),
            _ => writeln!(self.output, "Invalid choice, please try again.")?,
        }
        Ok(Flow::Continue)
    }

    fn admin_menu(&mut self) -> anyhow::Result<Flow> {
        writeln!(self.output)?;
        writeln!(self.output, "1. Define item type")?;
        writeln!(self.output, "2. Redefine type attributes")?;
        writeln!(self.output, "3. List item types")?;
        writeln!(self.output, "4. Approve users")?;
        writeln!(self.output, "5. Add administrator")?;
        writeln!(self.output, "0. Log out")?;

        let Some(choice) = self.prompt("Choose an option")? else {
            return Ok(Flow::Exit);
        };

        match choice.as_str() {
            "1" => self.define_type(),
            "2" => self.redefine_attributes(),
            "3" => self.list_types().map(|()| Flow::Continue),
            "4" => self.approve_users(),
            "5" => {
                let Some(registration) = self.prompt_registration()? else {
                    return Ok(Flow::Exit);
                };
                if report(&mut self.output, self.service.add_admin(registration))?.is_some() {
                    writeln!(self.output, "Administrator added.")?;
                }
                Ok(Flow::Continue)
            }
            "0" => self.logout(),
            _ => {
                writeln!(self.output, "Invalid choice, please try again.")?;
                Ok(Flow::Continue)
            }
        }
    }

    fn user_menu(&mut self) -> anyhow::Result<Flow> {
        writeln!(self.output)?;
        writeln!(self.output, "1. List item types")?;
        writeln!(self.output, "2. Add item")?;
        writeln!(self.output, "3. Search items")?;
        writeln!(self.output, "4. Show all items of a type")?;
        writeln!(self.output, "0. Log out")?;

        let Some(choice) = self.prompt("Choose an option")? else {
            return Ok(Flow::Exit);
        };

        match choice.as_str() {
            "1" => self.list_types().map(|()| Flow::Continue),
            "2" => self.add_item(),
            "3" => self.search(false),
            "4" => self.search(true),
            "0" => self.logout(),
            _ => {
                writeln!(self.output, "Invalid choice, please try again.")?;
                Ok(Flow::Continue)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────────

    fn login(&mut self) -> anyhow::Result<Flow> {
        let Some(username) = self.prompt("Username")? else {
            return Ok(Flow::Exit);
        };
        let Some(password) = self.prompt("Password")? else {
            return Ok(Flow::Exit);
        };

        match self.service.login(&username, &password) {
            Ok(principal) => writeln!(
                self.output,
                "Logged in as {} ({}).",
                principal.username, principal.role
            )?,
            Err(ServiceError::Domain(DomainError::UnknownUser(_) | DomainError::WrongPassword)) => {
                writeln!(self.output, "Invalid username or password.")?
            }
            Err(err) => report_error(&mut self.output, err)?,
        }
        Ok(Flow::Continue)
    }

    fn logout(&mut self) -> anyhow::Result<Flow> {
        if let Some(principal) = self.service.logout() {
            writeln!(self.output, "Goodbye, {}.", principal.username)?;
        }
        Ok(Flow::Continue)
    }

    fn define_type(&mut self) -> anyhow::Result<Flow> {
        let Some(name) = self.prompt("Type name")? else {
            return Ok(Flow::Exit);
        };
        let Some(attributes) = self.prompt("Attributes (comma-separated)")? else {
            return Ok(Flow::Exit);
        };

        let attributes = split_attributes(&attributes);
        if report(&mut self.output, self.service.define_type(&name, &attributes))?.is_some() {
            writeln!(self.output, "Item type '{}' defined.", name.trim())?;
        }
        Ok(Flow::Continue)
    }

    fn redefine_attributes(&mut self) -> anyhow::Result<Flow> {
        let Some(name) = self.prompt("Type name")? else {
            return Ok(Flow::Exit);
        };
        let lookup = self
            .service
            .describe_type(&name, Permission::RedefineAttributes);
        let current = match lookup {
            Ok(item_type) => item_type.attributes().join(", "),
            Err(err) => {
                report_error(&mut self.output, err)?;
                return Ok(Flow::Continue);
            }
        };
        writeln!(self.output, "Current attributes: {current}")?;

        let Some(attributes) = self.prompt("New attributes (comma-separated)")? else {
            return Ok(Flow::Exit);
        };
        let attributes = split_attributes(&attributes);
        let result = self.service.redefine_attributes(&name, &attributes);
        if report(&mut self.output, result)?.is_some() {
            writeln!(self.output, "Attributes of '{name}' updated.")?;
        }
        Ok(Flow::Continue)
    }

    fn list_types(&mut self) -> anyhow::Result<()> {
        let types = match self.service.list_types() {
            Ok(types) => types,
            Err(err) => return report_error(&mut self.output, err),
        };

        if types.is_empty() {
            writeln!(self.output, "No item types defined yet.")?;
        }
        for item_type in types {
            writeln!(
                self.output,
                "- {} [{}] ({} items)",
                item_type.name(),
                item_type.attributes().join(", "),
                item_type.items().len()
            )?;
        }
        Ok(())
    }

    fn approve_users(&mut self) -> anyhow::Result<Flow> {
        let pending: Vec<String> = match self.service.pending_approvals() {
            Ok(accounts) => accounts
                .into_iter()
                .map(|a| format!("{} <{}> {} / {}", a.username(), a.email, a.phone, a.address))
                .collect(),
            Err(err) => {
                report_error(&mut self.output, err)?;
                return Ok(Flow::Continue);
            }
        };

        if pending.is_empty() {
            writeln!(self.output, "No users are waiting for approval.")?;
            return Ok(Flow::Continue);
        }
        writeln!(self.output, "Waiting for approval:")?;
        for line in &pending {
            writeln!(self.output, "- {line}")?;
        }

        let Some(username) = self.prompt("Username to approve (blank to cancel)")? else {
            return Ok(Flow::Exit);
        };
        if username.is_empty() {
            return Ok(Flow::Continue);
        }

        match report(&mut self.output, self.service.approve(&username))? {
            Some(true) => writeln!(self.output, "User '{username}' approved.")?,
            Some(false) => writeln!(self.output, "User '{username}' was already approved.")?,
            None => {}
        }
        Ok(Flow::Continue)
    }

    fn add_item(&mut self) -> anyhow::Result<Flow> {
        let Some(type_name) = self.prompt("Item type")? else {
            return Ok(Flow::Exit);
        };
        let lookup = self.service.describe_type(&type_name, Permission::AddItem);
        let attributes: Vec<String> = match lookup {
            Ok(item_type) => item_type.record_attributes().map(str::to_string).collect(),
            Err(err) => {
                report_error(&mut self.output, err)?;
                return Ok(Flow::Continue);
            }
        };

        let mut values = BTreeMap::new();
        for attribute in attributes {
            let Some(value) = self.prompt(&attribute)? else {
                return Ok(Flow::Exit);
            };
            values.insert(attribute, value);
        }

        if let Some(record) = report(&mut self.output, self.service.add_item(&type_name, &values))? {
            writeln!(self.output, "Item '{}' added.", record.name())?;
        }
        Ok(Flow::Continue)
    }

    fn search(&mut self, show_all: bool) -> anyhow::Result<Flow> {
        let Some(type_name) = self.prompt("Item type")? else {
            return Ok(Flow::Exit);
        };
        let keyword = if show_all {
            String::new()
        } else {
            match self.prompt("Keyword")? {
                Some(keyword) => keyword,
                None => return Ok(Flow::Exit),
            }
        };

        let hits = match self.service.search(&type_name, &keyword) {
            Ok(hits) => hits,
            Err(err) => {
                report_error(&mut self.output, err)?;
                return Ok(Flow::Continue);
            }
        };

        if hits.is_empty() {
            writeln!(self.output, "No matching items.")?;
            return Ok(Flow::Continue);
        }
        writeln!(self.output, "{} item(s) found:", hits.len())?;
        let item_type = self.service.types().get(&type_name);
        for record in hits {
            write_record(&mut self.output, item_type, record)?;
        }
        Ok(Flow::Continue)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Prompt helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Print `label`, read one trimmed line. `None` at end of input.
    fn prompt(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line).context("failed to read input")? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn prompt_registration(&mut self) -> anyhow::Result<Option<Registration>> {
        let mut fields = Vec::with_capacity(5);
        for label in ["Username", "Address", "Phone", "Email", "Password"] {
            let Some(value) = self.prompt(label)? else {
                return Ok(None);
            };
            fields.push(value);
        }

        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();
        Ok(Some(Registration::new(next(), next(), next(), next(), next())))
    }
}

/// Print recoverable errors and carry on; propagate fatal ones.
fn report<W: Write, T>(output: &mut W, result: Result<T, ServiceError>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            report_error(output, err)?;
            Ok(None)
        }
    }
}

fn report_error<W: Write>(output: &mut W, err: ServiceError) -> anyhow::Result<()> {
    if err.is_fatal() {
        return Err(anyhow::Error::new(err).context("cannot continue without saving data"));
    }
    writeln!(output, "Error: {err}")?;
    Ok(())
}

fn split_attributes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

fn write_record<W: Write>(
    output: &mut W,
    item_type: Option<&ItemType>,
    record: &ItemRecord,
) -> std::io::Result<()> {
    match item_type {
        Some(item_type) => {
            for (attribute, value) in item_type.display_fields(record) {
                writeln!(output, "  {attribute}: {value}")?;
            }
        }
        None => {
            for (attribute, value) in record.fields() {
                writeln!(output, "  {attribute}: {value}")?;
            }
        }
    }
    writeln!(output)
}
