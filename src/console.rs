//! The console shell: every view request passes through the router and its
//! guard before anything is fetched or printed.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;

use crate::api::AgentaClient;
use crate::config::ConsoleConfig;
use crate::db::LocalStorage;
use crate::export::{self, ExportFormat};
use crate::login::{LoginOutcome, LOGIN_SUCCESS_MESSAGE};
use crate::models::{CreateCompanyInput, CreateRecordInput, RecordRow, UpdateRecordInput};
use crate::routes::{menu_key_for_path, Guarded, Route, Router, MENU};
use crate::session::SessionStore;
use crate::terminal;
use crate::views::{
    format_price, load_dashboard, AddRecordView, CompaniesView, Pagination, RecordsView,
};

/// Listing options shared by the list and export actions.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub search: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone)]
pub enum RecordsAction {
    List(ListOptions),
    Show { key: String },
    Edit { key: String, input: UpdateRecordInput },
    Delete { key: String, confirmed: bool },
    Export {
        search: Option<String>,
        format: ExportFormat,
        out: Option<PathBuf>,
    },
}

/// Changes to a company. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct CompanyChanges {
    pub name: Option<String>,
    pub agent_name: Option<String>,
    pub licence: Option<String>,
    pub records: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub enum CompanyAction {
    List(ListOptions),
    Show { key: String },
    Add { input: CreateCompanyInput },
    Edit { key: String, changes: CompanyChanges },
    Delete { key: String, confirmed: bool },
    Export {
        search: Option<String>,
        format: ExportFormat,
        out: Option<PathBuf>,
    },
}

/// A request for one of the protected views.
#[derive(Debug, Clone)]
pub enum ViewRequest {
    Records(RecordsAction),
    /// `None` shows the form's company choices without submitting.
    AddRecord(Option<CreateRecordInput>),
    Company(CompanyAction),
    Dashboard,
}

impl ViewRequest {
    pub fn route(&self) -> Route {
        match self {
            Self::Records(_) => Route::Records,
            Self::AddRecord(_) => Route::AddRecord,
            Self::Company(_) => Route::Company,
            Self::Dashboard => Route::Dashboard,
        }
    }

    /// The request a bare navigation to `route` makes.
    pub fn for_route(route: Route) -> Option<Self> {
        match route {
            Route::Login => None,
            Route::Records => Some(Self::Records(RecordsAction::List(ListOptions::default()))),
            Route::AddRecord => Some(Self::AddRecord(None)),
            Route::Company => Some(Self::Company(CompanyAction::List(ListOptions::default()))),
            Route::Dashboard => Some(Self::Dashboard),
        }
    }
}

pub struct Console<W: Write> {
    config: ConsoleConfig,
    client: AgentaClient,
    store: SessionStore,
    router: Router,
    out: W,
    interactive: bool,
}

impl<W: Write> Console<W> {
    pub fn new(config: ConsoleConfig, client: AgentaClient, store: SessionStore, out: W) -> Self {
        Self {
            config,
            client,
            store,
            router: Router::new(Route::Login),
            out,
            interactive: false,
        }
    }

    /// Allow prompting on the terminal (PIN entry, delete confirmation).
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// End the console, releasing the session store.
    pub fn close(self) -> LocalStorage {
        self.store.close()
    }

    // ============================================================
    // Session
    // ============================================================

    /// Run the login view. With `pin` the code is entered as a paste;
    /// without it the PIN pad is shown on the terminal.
    pub async fn login(&mut self, pin: Option<&str>) -> Result<()> {
        self.router.navigate(Route::Login, self.store.session(), || ());

        let outcome = match pin {
            Some(code) => terminal::login_with_code(&mut self.store, code).await?,
            None if self.interactive => match terminal::prompt_login(&mut self.store).await? {
                Some(outcome) => outcome,
                None => bail!("Login cancelled"),
            },
            None => bail!("No terminal available; pass the PIN with --pin"),
        };

        match outcome {
            LoginOutcome::Authenticated { landing } => {
                writeln!(self.out, "{}", LOGIN_SUCCESS_MESSAGE)?;
                self.router.navigate(landing, self.store.session(), || ());
                Ok(())
            }
            LoginOutcome::Rejected { message } => bail!(message),
            LoginOutcome::Editing => bail!("PIN incomplete"),
        }
    }

    pub fn logout(&mut self) -> Result<()> {
        self.store.logout().context("Failed to clear the stored session")?;
        self.router.navigate(Route::Login, self.store.session(), || ());
        writeln!(self.out, "Logged out")?;
        Ok(())
    }

    pub fn status(&mut self) -> Result<()> {
        let state = if self.store.is_authenticated() {
            "logged in"
        } else {
            "logged out"
        };
        writeln!(self.out, "Session: {}", state)?;
        writeln!(self.out, "API:     {}", self.client.base_url())?;
        Ok(())
    }

    /// Print the effective configuration. With `save` it also becomes the
    /// stored configuration, including any command-line overrides.
    pub fn config(&mut self, save: bool) -> Result<()> {
        let storage = match &self.config.storage_path {
            Some(path) => path.display().to_string(),
            None => "default".to_string(),
        };
        writeln!(self.out, "api_url:              {}", self.config.api_url)?;
        writeln!(self.out, "pin:                  ****")?;
        writeln!(self.out, "storage_path:         {}", storage)?;
        writeln!(self.out, "page_size:            {}", self.config.page_size)?;
        writeln!(self.out, "request_timeout_secs: {}", self.config.request_timeout_secs)?;
        writeln!(self.out, "trust_on_restart:     {}", self.config.trust_on_restart)?;

        if save {
            let path = self.config.save().context("Failed to save configuration")?;
            writeln!(self.out, "Saved to {}", path.display())?;
        }
        Ok(())
    }

    // ============================================================
    // Protected views
    // ============================================================

    /// Navigate to `path` and show its default view.
    pub async fn open(&mut self, path: &str) -> Result<()> {
        let Some(guarded) = self
            .router
            .open(path, self.store.session(), ViewRequest::for_route)
        else {
            bail!("No page at {}", path);
        };
        match guarded {
            Guarded::Render(Some(request)) => self.render(request).await,
            Guarded::Render(None) => self.login(None).await,
            Guarded::Redirect { to, .. } => {
                let from = Route::from_path(path).unwrap_or(to);
                self.redirected(from, to).await
            }
        }
    }

    /// Pass `request` through the guard and render it.
    pub async fn show(&mut self, request: ViewRequest) -> Result<()> {
        let route = request.route();
        match self.router.navigate(route, self.store.session(), || request) {
            Guarded::Render(request) => self.render(request).await,
            Guarded::Redirect { to, .. } => self.redirected(route, to).await,
        }
    }

    async fn redirected(&mut self, from: Route, to: Route) -> Result<()> {
        tracing::info!("{} requires login, redirected to {}", from, to);
        if !self.interactive {
            bail!("Not logged in. Run `agenta login` first.");
        }

        writeln!(self.out, "Login required")?;
        self.out.flush()?;
        self.login(None).await?;

        // A successful login lands on the record list, not the page first asked for.
        let landing = self.router.current();
        match ViewRequest::for_route(landing) {
            Some(request) => self.render(request).await,
            None => Ok(()),
        }
    }

    async fn render(&mut self, request: ViewRequest) -> Result<()> {
        self.header(request.route())?;
        match request {
            ViewRequest::Records(action) => self.records(action).await,
            ViewRequest::AddRecord(input) => self.add_record(input).await,
            ViewRequest::Company(action) => self.company(action).await,
            ViewRequest::Dashboard => self.dashboard().await,
        }
    }

    /// Page title and the side menu, the current entry in brackets.
    fn header(&mut self, route: Route) -> Result<()> {
        let selected = menu_key_for_path(route.path());
        let menu: Vec<String> = MENU
            .iter()
            .map(|(key, label, _)| {
                if *key == selected {
                    format!("[{label}]")
                } else {
                    label.to_string()
                }
            })
            .collect();
        writeln!(self.out, "{} | {}", route.title(), menu.join(" "))?;
        Ok(())
    }

    async fn records(&mut self, action: RecordsAction) -> Result<()> {
        let page_size = match &action {
            RecordsAction::List(options) => options.page_size,
            _ => None,
        };
        let mut view = RecordsView::new(Pagination::default());
        view.set_page_size(page_size.unwrap_or(self.config.page_size))?;
        view.load(&self.client).await?;

        match action {
            RecordsAction::List(options) => {
                if let Some(query) = &options.search {
                    view.search(query);
                }
                view.set_page(options.page.unwrap_or(1));
                let table = export::render_table(view.page_rows(), terminal::width());
                writeln!(self.out, "{}", table)?;
                writeln!(
                    self.out,
                    "Page {} of {} · {} record(s)",
                    view.pagination().page,
                    view.total_pages(),
                    view.displayed().len()
                )?;
            }
            RecordsAction::Show { key } => {
                let Some(row) = view.find(&key) else {
                    bail!("Record not found");
                };
                let details = record_details(row);
                write!(self.out, "{}", details)?;
            }
            RecordsAction::Edit { key, input } => {
                if input.is_empty() {
                    bail!("Nothing to update");
                }
                let notice = view.update(&self.client, &key, &input).await?;
                writeln!(self.out, "{}", notice)?;
            }
            RecordsAction::Delete { key, confirmed } => {
                self.confirm_delete("record", confirmed)?;
                let notice = view.delete(&self.client, &key).await?;
                writeln!(self.out, "{}", notice)?;
            }
            RecordsAction::Export {
                search,
                format,
                out,
            } => {
                if let Some(query) = &search {
                    view.search(query);
                }
                let dir = std::env::current_dir()?;
                let path = export::export_rows(view.displayed(), format, out.as_deref(), &dir)?;
                writeln!(
                    self.out,
                    "Exported {} record(s) to {}",
                    view.displayed().len(),
                    path.display()
                )?;
            }
        }
        Ok(())
    }

    async fn company(&mut self, action: CompanyAction) -> Result<()> {
        let page_size = match &action {
            CompanyAction::List(options) => options.page_size,
            _ => None,
        };
        let mut view = CompaniesView::new(Pagination::default());
        view.set_page_size(page_size.unwrap_or(self.config.page_size))?;
        view.load(&self.client).await?;

        match action {
            CompanyAction::List(options) => {
                if let Some(query) = &options.search {
                    view.search(query);
                }
                view.set_page(options.page.unwrap_or(1));
                let table = export::render_table(view.page_rows(), terminal::width());
                writeln!(self.out, "{}", table)?;
                writeln!(
                    self.out,
                    "Page {} of {} · {} compan{}",
                    view.pagination().page,
                    view.total_pages(),
                    view.displayed().len(),
                    if view.displayed().len() == 1 { "y" } else { "ies" }
                )?;
            }
            CompanyAction::Show { key } => {
                let c = view.details(&self.client, &key).await?;
                writeln!(self.out, "Company: {}", c.name.as_deref().unwrap_or("-"))?;
                writeln!(
                    self.out,
                    "Agent Name: {}",
                    c.agent_name.as_deref().unwrap_or("No agent name available")
                )?;
                writeln!(
                    self.out,
                    "Licence: {}",
                    c.licence.as_deref().unwrap_or("No licence available")
                )?;
                let records: Vec<&str> = c
                    .records
                    .iter()
                    .map(|r| r.name().unwrap_or(r.id()))
                    .collect();
                writeln!(self.out, "Records: {}", records.len())?;
                for record in records {
                    writeln!(self.out, "  - {}", record)?;
                }
            }
            CompanyAction::Add { input } => {
                let notice = view.add(&self.client, &input).await?;
                writeln!(self.out, "{}", notice)?;
            }
            CompanyAction::Edit { key, changes } => {
                let mut input = view.edit_form(&key)?;
                if let Some(name) = changes.name {
                    input.name = name;
                }
                if let Some(agent_name) = changes.agent_name {
                    input.agent_name = Some(agent_name);
                }
                if let Some(licence) = changes.licence {
                    input.licence = Some(licence);
                }
                if let Some(records) = changes.records {
                    input.records = records;
                }
                let notice = view.update(&self.client, &key, &input).await?;
                writeln!(self.out, "{}", notice)?;
            }
            CompanyAction::Delete { key, confirmed } => {
                self.confirm_delete("company", confirmed)?;
                let notice = view.delete(&self.client, &key).await?;
                writeln!(self.out, "{}", notice)?;
            }
            CompanyAction::Export {
                search,
                format,
                out,
            } => {
                if let Some(query) = &search {
                    view.search(query);
                }
                let dir = std::env::current_dir()?;
                let path = export::export_rows(view.displayed(), format, out.as_deref(), &dir)?;
                let count = view.displayed().len();
                writeln!(
                    self.out,
                    "Exported {} compan{} to {}",
                    count,
                    if count == 1 { "y" } else { "ies" },
                    path.display()
                )?;
            }
        }
        Ok(())
    }

    async fn add_record(&mut self, input: Option<CreateRecordInput>) -> Result<()> {
        let mut view = AddRecordView::new();
        if let Err(e) = view.load_companies(&self.client).await {
            writeln!(self.out, "{}", e)?;
        }

        let Some(mut input) = input else {
            writeln!(self.out, "Companies:")?;
            for company in view.companies() {
                writeln!(
                    self.out,
                    "  {}  {}",
                    company.id,
                    company.name.as_deref().unwrap_or("-")
                )?;
            }
            return Ok(());
        };

        if let Some(company) = view.resolve_company(&input.company) {
            input.company = company.id.clone();
        }

        let submitted = view.submit(&self.client, &input).await?;
        writeln!(self.out, "{}", submitted.notice)?;
        self.router
            .navigate(submitted.navigate, self.store.session(), || ());
        Ok(())
    }

    async fn dashboard(&mut self) -> Result<()> {
        let summary = load_dashboard(&self.client, Utc::now()).await?;
        writeln!(self.out, "Records:       {}", summary.record_count)?;
        writeln!(self.out, "Companies:     {}", summary.company_count)?;
        writeln!(self.out, "Total premium: {}", format_price(summary.total_premium))?;
        writeln!(
            self.out,
            "Expiring in the next {} days: {}",
            crate::views::EXPIRY_WINDOW_DAYS,
            summary.expiring_soon.len()
        )?;
        if !summary.expiring_soon.is_empty() {
            let table = export::render_table(&summary.expiring_soon, terminal::width());
            writeln!(self.out, "{}", table)?;
        }
        Ok(())
    }

    fn confirm_delete(&mut self, what: &str, confirmed: bool) -> Result<()> {
        if confirmed {
            return Ok(());
        }
        if !self.interactive {
            bail!("Refusing to delete without --yes");
        }
        let question = format!(
            "Deleting this {what} will remove it permanently. Are you sure? [y/N] "
        );
        if !terminal::confirm(&question)? {
            bail!("Delete cancelled");
        }
        Ok(())
    }
}

fn record_details(row: &RecordRow) -> String {
    let r = &row.record;
    let date = |d: Option<chrono::DateTime<Utc>>| {
        d.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    let company = r
        .company
        .as_ref()
        .map(|c| c.name().unwrap_or(c.id()).to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "Record {}\n\
         Vehicle No: {}\n\
         Vehicle Name: {}\n\
         Policy: {}\n\
         Owner Name: {}\n\
         Insurance Type: {}\n\
         Insurance Price: {}\n\
         Insurance Date: {}\n\
         Expiry Date: {}\n\
         Company: {}\n",
        row.rno,
        r.vehicle_number,
        r.vehicle_name,
        r.policy,
        r.owner_name,
        r.ins_type,
        format_price(r.ins_price),
        date(r.insurance_date),
        date(r.expiry_date),
        company,
    )
}
