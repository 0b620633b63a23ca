use log::{debug, warn};
use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::billing::MeterCategory;
use crate::output::LedgerFormatter;
use crate::services::BillingService;
use crate::utils::error::BillingError;

enum Flow {
    Continue,
    Exit,
}

/// Numbered menu over any line-based input.
pub struct Shell<'a, R, W> {
    service: &'a BillingService,
    formatter: &'a dyn LedgerFormatter,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(service: &'a BillingService, formatter: &'a dyn LedgerFormatter, input: R, output: W) -> Self {
        Self {
            service,
            formatter,
            input,
            output,
        }
    }

    /// Loop until `0` or end of input. A failed action is reported and the
    /// menu is shown again.
    pub async fn run(&mut self) -> Result<(), BillingError> {
        loop {
            self.print_menu()?;

            let choice = match self.prompt("Select an action: ")? {
                Some(choice) => choice,
                None => break,
            };

            let result = match choice.trim() {
                "1" => self.add_tenant().await,
                "2" => self.add_meter().await,
                "3" => self.record_reading().await,
                "4" => self.list_payments().await,
                "5" => self.export_csv().await,
                "0" => Ok(Flow::Exit),
                other => {
                    debug!("Ignoring menu choice '{}'", other);
                    writeln!(self.output, "Invalid choice!")?;
                    Ok(Flow::Continue)
                }
            };

            match result {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(e) => {
                    warn!("Action failed: {}", e);
                    writeln!(self.output, "Error: {}", e)?;
                }
            }
        }

        writeln!(self.output, "Goodbye!")?;
        Ok(())
    }

    fn print_menu(&mut self) -> Result<(), BillingError> {
        writeln!(self.output)?;
        writeln!(self.output, "--- UTILITY BILLING ---")?;
        writeln!(self.output, "1. Add tenant")?;
        writeln!(self.output, "2. Add meter")?;
        writeln!(self.output, "3. Record reading")?;
        writeln!(self.output, "4. Show all payments")?;
        writeln!(self.output, "5. Export to CSV")?;
        writeln!(self.output, "0. Exit")?;
        Ok(())
    }

    /// `None` means the input is exhausted. Only the line ending is stripped
    /// so names and categories are kept as typed.
    fn prompt(&mut self, label: &str) -> Result<Option<String>, BillingError> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn prompt_parsed<T: FromStr>(&mut self, label: &str, field: &str) -> Result<Option<T>, BillingError> {
        match self.prompt(label)? {
            Some(raw) => parse_field(field, raw.trim()).map(Some),
            None => Ok(None),
        }
    }

    async fn add_tenant(&mut self) -> Result<Flow, BillingError> {
        let Some(name) = self.prompt("Tenant name: ")? else {
            return Ok(Flow::Exit);
        };

        let tenant = self.service.add_tenant(&name).await?;
        writeln!(self.output, "Tenant added ({}).", tenant.id)?;
        Ok(Flow::Continue)
    }

    async fn add_meter(&mut self) -> Result<Flow, BillingError> {
        let tenants = self.service.list_tenants().await?;
        write!(self.output, "{}", self.formatter.format_tenants(&tenants))?;

        let Some(tenant_id) = self.prompt_parsed::<i64>("Tenant ID: ", "tenant id")? else {
            return Ok(Flow::Exit);
        };
        let label = format!("Meter type ({}): ", MeterCategory::known_names().join("/"));
        let Some(category) = self.prompt(&label)? else {
            return Ok(Flow::Exit);
        };
        let Some(initial) = self.prompt_parsed::<f64>("Initial reading: ", "initial reading")? else {
            return Ok(Flow::Exit);
        };

        self.service.add_meter(tenant_id, &category, initial).await?;
        writeln!(self.output, "Meter added.")?;
        Ok(Flow::Continue)
    }

    async fn record_reading(&mut self) -> Result<Flow, BillingError> {
        let meters = self.service.list_meters().await?;
        write!(self.output, "{}", self.formatter.format_meters(&meters))?;

        let Some(meter_id) = self.prompt_parsed::<i64>("Meter ID: ", "meter id")? else {
            return Ok(Flow::Exit);
        };
        let Some(value) = self.prompt_parsed::<f64>("New reading: ", "reading")? else {
            return Ok(Flow::Exit);
        };

        let outcome = self.service.record_reading(meter_id, value).await?;
        write!(self.output, "{}", self.formatter.format_reading(&outcome))?;
        Ok(Flow::Continue)
    }

    async fn list_payments(&mut self) -> Result<Flow, BillingError> {
        let payments = self.service.list_payments().await?;
        write!(self.output, "{}", self.formatter.format_payments(&payments))?;
        Ok(Flow::Continue)
    }

    async fn export_csv(&mut self) -> Result<Flow, BillingError> {
        let written = self.service.export_payments_csv_default().await?;
        writeln!(self.output, "Export complete: {}", written.display())?;
        Ok(Flow::Continue)
    }
}

fn parse_field<T: FromStr>(field: &str, raw: &str) -> Result<T, BillingError> {
    raw.parse::<T>()
        .map_err(|_| BillingError::InvalidInput(format!("'{}' is not a valid {}", raw, field)))
}
