//! CLI runner - executes commands

use crate::api::{BookingRequest, YClientsApi};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ApiConfig;
use crate::error::{Result, ResultExt};
use crate::output::{pretty_table, records_to_batch, summaries_to_batch};
use crate::types::Record;
use crate::visits::VisitSummary;
use serde_json::Value;
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let api = YClientsApi::new(self.load_config()?)?;
        self.authorize(&api)
            .await
            .context("User authorization failed")?;

        match &self.cli.command {
            Commands::Staff {
                id: Some(id), ..
            } => self.output_json(&api.get_staff_info(*id).await?),
            Commands::Staff {
                id: None,
                service,
                datetime,
            } => self.output_json(&api.get_staff(*service, datetime.as_deref()).await?),
            Commands::Services {
                id: Some(id), ..
            } => self.output_json(&api.get_service_info(*id).await?),
            Commands::Services {
                id: None,
                staff,
                datetime,
            } => self.output_json(&api.get_services(*staff, datetime.as_deref()).await?),
            Commands::Days { staff, service } => {
                self.output_json(&api.get_available_days(*staff, *service).await?)
            }
            Commands::Times {
                staff,
                day,
                service,
            } => self.output_json(&api.get_available_times(*staff, day, *service).await?),
            Commands::Book {
                booking_id,
                fullname,
                phone,
                email,
                service,
                staff,
                datetime,
                comment,
            } => {
                let mut request =
                    BookingRequest::new(*booking_id, fullname, phone, email, *service, datetime);
                request.staff_id = *staff;
                request.comment.clone_from(comment);
                let outcome = api.book(&request).await?;
                self.output_json(&serde_json::to_value(outcome)?)
            }
            Commands::Permissions => self.output_json(&api.user_permissions().await?),
            Commands::Clients { per_page } => {
                let clients = api.get_clients_data(self.per_page(&api, *per_page)).await?;
                self.output_records(&api, &clients)
            }
            Commands::Visits {
                clients,
                attended,
                per_page,
            } => self.visits(&api, clients, *attended, *per_page).await,
            Commands::Summary { clients, per_page } => {
                let summaries = api
                    .get_attended_visits_dates_information(
                        clients,
                        self.per_page(&api, *per_page),
                        None,
                    )
                    .await?;
                self.output_summaries(&summaries)
            }
        }
    }

    fn load_config(&self) -> Result<ApiConfig> {
        match &self.cli.config {
            Some(path) => {
                debug!(path = %path.display(), "Loading config file");
                ApiConfig::from_file(path)
            }
            None => ApiConfig::from_env(),
        }
    }

    async fn authorize(&self, api: &YClientsApi) -> Result<()> {
        if let (Some(login), Some(password)) = (&self.cli.login, &self.cli.password) {
            api.login(login, password).await?;
        }
        Ok(())
    }

    fn per_page(&self, api: &YClientsApi, requested: Option<u32>) -> u32 {
        requested.unwrap_or(api.config().per_page)
    }

    async fn visits(
        &self,
        api: &YClientsApi,
        clients: &[u64],
        attended: bool,
        per_page: Option<u32>,
    ) -> Result<()> {
        let per_page = self.per_page(api, per_page);
        let context = api.open_context()?;

        let mut all = Vec::new();
        for &client in clients {
            let visits = if attended {
                api.get_attended_visits_for_client(client, per_page, Some(&context))
                    .await?
            } else {
                api.get_visits_for_client(client, per_page, Some(&context))
                    .await?
            };
            all.extend(visits);
        }
        self.output_records(api, &all)
    }

    fn output_records(&self, api: &YClientsApi, records: &[Record]) -> Result<()> {
        match self.cli.format {
            OutputFormat::Table => {
                let batch = records_to_batch(records, api.config().column_policy)?;
                println!("{}", pretty_table(&batch)?);
                Ok(())
            }
            _ => self.output_json(&Value::Array(
                records.iter().cloned().map(Value::Object).collect(),
            )),
        }
    }

    fn output_summaries(&self, summaries: &[VisitSummary]) -> Result<()> {
        match self.cli.format {
            OutputFormat::Table => {
                println!("{}", pretty_table(&summaries_to_batch(summaries)?)?);
                Ok(())
            }
            _ => self.output_json(&serde_json::to_value(summaries)?),
        }
    }

    fn output_json(&self, value: &Value) -> Result<()> {
        let text = match self.cli.format {
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
            OutputFormat::Json | OutputFormat::Table => serde_json::to_string(value)?,
        };
        println!("{text}");
        Ok(())
    }
}
