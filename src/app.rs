#![cfg(feature = "web")]
//! Routing, page rendering and request handlers.

use crate::config::{AppConfig, Role, StoreKind, UserEntry};
use crate::downloader::{to_csv, to_xlsx};
use crate::error::{StoreError, ValidationError};
use crate::graph::{ChartOptions, applicants_per_day, render_line_chart};
use crate::login::{CurrentSession, Session, SessionStore, handle_login, handle_logout};
use crate::mailer::{FeedbackNotifier, Mailer};
use crate::record::{
    APPLICANT_COLUMNS, APPLICANTS_WORKSHEET, ApplicantForm, FEEDBACK_COLUMNS, FEEDBACK_WORKSHEET,
    FeedbackForm, format_sheet_date, parse_form_date,
};
use crate::search::{
    self, HISTORY_LEN, Search, SubmissionFilter, YEAR_MAX, YEAR_MIN, display_table,
    records_from_table, results_table,
};
use crate::store::{FileStore, MemoryStore, SheetStore, Table, append_row};
use axum::{
    Form, Router,
    extract::{Query, Request, State},
    http::{StatusCode, Uri, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use handlebars::Handlebars;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;

/// Shared by every handler; one per server
pub struct AppState {
    pub store: Arc<dyn SheetStore>,
    pub sessions: SessionStore,
    pub users: Vec<UserEntry>,
    pub notifier: Option<Arc<dyn FeedbackNotifier>>,
    templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SheetStore>,
        users: Vec<UserEntry>,
        notifier: Option<Arc<dyn FeedbackNotifier>>,
    ) -> Result<Self, handlebars::TemplateError> {
        Ok(AppState {
            store,
            sessions: SessionStore::new(),
            users,
            notifier,
            templates: build_templates()?,
        })
    }

    fn render(&self, template: &str, context: &Value) -> Result<Html<String>, AppError> {
        Ok(Html(self.templates.render(template, context)?))
    }

    fn applicants(&self) -> Result<Table, StoreError> {
        self.store.read(APPLICANTS_WORKSHEET, &APPLICANT_COLUMNS)
    }
}

fn build_templates() -> Result<Handlebars<'static>, handlebars::TemplateError> {
    let mut templates = Handlebars::new();
    templates.register_partial("header", include_str!("./static/header.hbs"))?;
    templates.register_partial("footer", include_str!("./static/footer.hbs"))?;
    templates.register_partial("table", include_str!("./static/table.hbs"))?;
    for (name, source) in [
        ("login", include_str!("./static/login.hbs")),
        ("entry", include_str!("./static/entry.hbs")),
        ("search", include_str!("./static/search.hbs")),
        ("history", include_str!("./static/history.hbs")),
        ("analytics", include_str!("./static/analytics.hbs")),
        ("feedback", include_str!("./static/feedback.hbs")),
        ("feedback_list", include_str!("./static/feedback_list.hbs")),
        ("edit", include_str!("./static/edit.hbs")),
    ] {
        templates.register_template_string(name, source)?;
    }
    Ok(templates)
}

/// Errors surfaced to the browser as an error page
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Template error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("This page is not available to your account.")]
    Forbidden,

    #[error("Export failed: {0}")]
    Export(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Render(_) | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Store(e) => warn!("sheet store failure: {}", e),
            AppError::Render(_) | AppError::Export(_) => error!("{}", self),
            _ => {}
        }
        let body = format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Error</title>\
             <link rel=\"stylesheet\" href=\"/static/app.css\"></head>\
             <body><main><p class=\"error\">{}</p><p><a href=\"/\">Back</a></p></main></body></html>",
            handlebars::html_escape(&self.to_string())
        );
        (self.status(), Html(body)).into_response()
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Template context shared by every logged-in page
fn page(session: &Session, title: &str, extra: Value) -> Value {
    let mut context = json!({
        "title": title,
        "user": session.username,
        "is_maintainer": session.role == Role::Maintainer,
    });
    if let (Some(base), Value::Object(extra)) = (context.as_object_mut(), extra) {
        base.extend(extra);
    }
    context
}

fn filter_options(current: SubmissionFilter) -> Value {
    let options = [
        (SubmissionFilter::All, "All"),
        (SubmissionFilter::WalkIn, "Walk-in"),
        (SubmissionFilter::Online, "Online"),
    ];
    options
        .iter()
        .map(|(filter, label)| {
            json!({
                "value": filter.as_str(),
                "label": label,
                "checked": *filter == current,
            })
        })
        .collect()
}

/// File download with a suggested name
fn attachment(body: impl Into<axum::body::Body>, content_type: &str, filename: &str) -> Response {
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .filter(|c| *c != '"')
        .collect();
    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    );
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body.into(),
    )
        .into_response()
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_home))
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/applicants", post(submit_applicant))
        .route("/search", get(serve_search))
        .route("/search/download", get(download_search))
        .route("/history", get(serve_history))
        .route("/analytics", get(serve_analytics))
        .route("/analytics/chart.svg", get(serve_chart))
        .route("/feedback", get(serve_feedback).post(submit_feedback))
        .route("/feedback/all", get(serve_feedback_list))
        .route("/edit", get(serve_editor))
        .route("/edit/unlock", post(unlock_editor))
        .route("/edit/save", post(save_editor))
        .route("/edit/finish", post(finish_editor))
        .route("/edit/download.csv", get(download_all_csv))
        .route("/edit/download.xlsx", get(download_all_xlsx))
        .route("/static/app.css", get(serve_css))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

/// Open the configured store, wire up mail and serve until the process ends
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn SheetStore> = match config.store.kind {
        StoreKind::File => Arc::new(FileStore::open(&config.store.path)?),
        StoreKind::Memory => {
            warn!("using in-memory sheet store; entries are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let notifier: Option<Arc<dyn FeedbackNotifier>> = match &config.mail {
        Some(settings) => Some(Arc::new(Mailer::new(settings)?)),
        None => {
            info!("no [mail] section; feedback notifications disabled");
            None
        }
    };

    let state = Arc::new(AppState::new(store, config.users.clone(), notifier)?);
    let app = build_router(state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Listening on http://{}", address);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_css() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css")],
        include_str!("./static/app.css"),
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginQuery {
    error: Option<String>,
}

/// Login page when logged out; the entry form (or feedback list for
/// maintainers) otherwise
async fn serve_home(
    State(state): State<Arc<AppState>>,
    current: Option<CurrentSession>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    match current {
        None => {
            let context = json!({
                "title": "Welcome to the Applicant Management System",
                "error": query.error,
            });
            Ok(state.render("login", &context)?.into_response())
        }
        Some(current) if current.session.role == Role::Maintainer => {
            Ok(Redirect::to("/feedback/all").into_response())
        }
        Some(current) => Ok(render_entry(&state, &current.session, None, None)?.into_response()),
    }
}

fn render_entry(
    state: &AppState,
    session: &Session,
    notice: Option<&str>,
    error: Option<&str>,
) -> Result<Html<String>, AppError> {
    let (row_count, store_error) = match state.applicants() {
        Ok(table) => (table.len(), None),
        Err(e) => {
            warn!("sheet store unreachable: {}", e);
            (0, Some(e.to_string()))
        }
    };
    let context = page(
        session,
        "Enter New Applicant",
        json!({
            "today": today().format("%Y-%m-%d").to_string(),
            "row_count": row_count,
            "store_error": store_error,
            "notice": notice,
            "error": error,
        }),
    );
    state.render("entry", &context)
}

async fn submit_applicant(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    Form(form): Form<ApplicantForm>,
) -> Result<Response, AppError> {
    let record = match form.into_record(today()) {
        Ok(record) => record,
        Err(e) => {
            let page = render_entry(&state, &current.session, None, Some(&e.to_string()))?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let table = append_row(
        state.store.as_ref(),
        APPLICANTS_WORKSHEET,
        &APPLICANT_COLUMNS,
        record.to_row(),
    )?;
    info!(
        "'{}' added applicant row {} ({})",
        current.session.username,
        table.len(),
        if record.is_online() { "online" } else { "walk-in" }
    );

    Ok(render_entry(
        &state,
        &current.session,
        Some("Data Successfully Submitted."),
        None,
    )?
    .into_response())
}

/// Query string of the search page
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchParams {
    by: String,
    q: String,
    date: String,
    filter: SubmissionFilter,
    position: String,
    year: String,
}

impl SearchParams {
    /// The search to run, or `None` while the needed input is still blank
    fn search(&self) -> Result<Option<Search>, ValidationError> {
        let date = || {
            parse_form_date(&self.date).ok_or_else(|| ValidationError::InvalidDate(self.date.clone()))
        };
        let search = match self.by.as_str() {
            "name" if !self.q.trim().is_empty() => Search::Name(self.q.trim().to_string()),
            "date" if !self.date.is_empty() => Search::Date {
                date: date()?,
                filter: self.filter,
            },
            "date-submitted" if !self.date.is_empty() => Search::DateSubmitted {
                date: date()?,
                filter: self.filter,
            },
            "position" if !self.position.is_empty() => Search::Position(self.position.clone()),
            "year" if !self.year.trim().is_empty() => {
                let year = self.year.trim().parse().map_err(|_| ValidationError::YearOutOfRange {
                    min: YEAR_MIN,
                    max: YEAR_MAX,
                })?;
                Search::Year(year)
            }
            _ => return Ok(None),
        };
        Ok(Some(search))
    }
}

const SEARCH_KINDS: [(&str, &str); 6] = [
    ("", "Please select an option"),
    ("name", "Name"),
    ("date", "Date"),
    ("date-submitted", "Date Submitted"),
    ("position", "Desired Position"),
    ("year", "Year"),
];

async fn serve_search(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    Query(params): Query<SearchParams>,
    uri: Uri,
) -> Result<Response, AppError> {
    let records = records_from_table(&state.applicants()?);

    let kinds: Vec<Value> = SEARCH_KINDS
        .iter()
        .map(|(value, label)| json!({"value": value, "label": label, "selected": *value == params.by}))
        .collect();
    let positions: Vec<Value> = search::positions(&records)
        .into_iter()
        .map(|p| json!({"selected": p == params.position, "value": p}))
        .collect();
    let year = match params.year.as_str() {
        "" => YEAR_MIN.to_string(),
        entered => entered.to_string(),
    };

    let mut extra = json!({
        "kinds": kinds,
        "positions": positions,
        "filters": filter_options(params.filter),
        "q": params.q,
        "date": params.date,
        "year": year,
        "year_min": YEAR_MIN,
        "year_max": YEAR_MAX,
        "table": Value::Null,
    });

    let mut status = StatusCode::OK;
    match params.search() {
        Ok(None) => extra["info"] = json!("Please select an option."),
        Ok(Some(search)) => match search.run(&records) {
            Ok(table) if table.is_empty() => {
                extra["info"] = json!(format!("No results found. ({})", search.heading()));
            }
            Ok(table) => {
                extra["heading"] = json!(search.heading());
                extra["table"] = json!(table);
                extra["download_url"] =
                    json!(format!("/search/download?{}", uri.query().unwrap_or_default()));
            }
            Err(e) => {
                status = StatusCode::UNPROCESSABLE_ENTITY;
                extra["error"] = json!(e.to_string());
            }
        },
        Err(e) => {
            status = StatusCode::UNPROCESSABLE_ENTITY;
            extra["error"] = json!(e.to_string());
        }
    }

    let html = state.render("search", &page(&current.session, "Search", extra))?;
    Ok((status, html).into_response())
}

async fn download_search(
    State(state): State<Arc<AppState>>,
    _current: CurrentSession,
    Query(params): Query<SearchParams>,
) -> Result<Response, AppError> {
    let Some(search) = params.search()? else {
        return Err(ValidationError::MissingRequired.into());
    };
    let records = records_from_table(&state.applicants()?);
    let table = search.run(&records)?;
    Ok(attachment(
        to_csv(&table),
        "text/csv; charset=utf-8",
        &search.download_name(),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoryParams {
    filter: SubmissionFilter,
}

async fn serve_history(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    Query(params): Query<HistoryParams>,
) -> Result<Html<String>, AppError> {
    let records = records_from_table(&state.applicants()?);
    let table = results_table(&search::last_ten(&records, params.filter));
    let context = page(
        &current.session,
        &format!("History (Last {} Entries)", HISTORY_LEN),
        json!({
            "filters": filter_options(params.filter),
            "table": table,
        }),
    );
    state.render("history", &context)
}

async fn serve_analytics(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Result<Html<String>, AppError> {
    let records = records_from_table(&state.applicants()?);
    let rows = applicants_per_day(&records)
        .into_iter()
        .map(|(date, count)| vec![format_sheet_date(date), count.to_string()])
        .collect();
    let table = Table::with_rows(&["DATE", "Applicants"], rows);
    let context = page(
        &current.session,
        "Number of Applicants Over Time",
        json!({ "table": table }),
    );
    state.render("analytics", &context)
}

async fn serve_chart(
    State(state): State<Arc<AppState>>,
    _current: CurrentSession,
) -> Result<Response, AppError> {
    let records = records_from_table(&state.applicants()?);
    let series = applicants_per_day(&records);
    let svg = render_line_chart(&series, &ChartOptions::default())
        .map_err(|e| AppError::Export(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

fn render_feedback(
    state: &AppState,
    session: &Session,
    notice: Option<String>,
    error: Option<String>,
) -> Result<Html<String>, AppError> {
    let context = page(
        session,
        "Contact the developer",
        json!({
            "author": session.username,
            "notice": notice,
            "error": error,
        }),
    );
    state.render("feedback", &context)
}

async fn serve_feedback(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Result<Html<String>, AppError> {
    render_feedback(&state, &current.session, None, None)
}

/// Append the feedback, then tell the maintainer if mail is configured.
///
/// A failed notification is logged and mentioned on the page; the feedback
/// row stays written.
async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, AppError> {
    let rejected = |e: ValidationError| -> Result<Response, AppError> {
        let page = render_feedback(&state, &current.session, None, Some(e.to_string()))?;
        Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
    };

    let record = match form.into_record(today()) {
        Ok(record) => record,
        Err(e) => return rejected(e),
    };

    match append_row(
        state.store.as_ref(),
        FEEDBACK_WORKSHEET,
        &FEEDBACK_COLUMNS,
        record.to_row(),
    ) {
        Ok(_) => {}
        Err(StoreError::MissingColumn { .. }) => return rejected(ValidationError::FeedbackSchema),
        Err(e) => return Err(e.into()),
    }
    info!("feedback '{}' submitted by '{}'", record.title, record.user);

    let mut notice = "Feedback Submitted Successfully.".to_string();
    if let Some(notifier) = state.notifier.clone() {
        let sent = {
            let record = record.clone();
            tokio::task::spawn_blocking(move || notifier.notify(&record)).await
        };
        match sent {
            Ok(Ok(())) => {
                notice.push_str(" The developer has been notified of your feedback, thank you!");
            }
            Ok(Err(e)) => {
                warn!("feedback notification failed: {}", e);
                notice.push_str(" The notification email could not be sent.");
            }
            Err(e) => {
                error!("feedback notification task failed: {}", e);
                notice.push_str(" The notification email could not be sent.");
            }
        }
    }

    Ok(render_feedback(&state, &current.session, Some(notice), None)?.into_response())
}

async fn serve_feedback_list(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Result<Html<String>, AppError> {
    if current.session.role != Role::Maintainer {
        return Err(AppError::Forbidden);
    }
    let table = match state.store.read(FEEDBACK_WORKSHEET, &FEEDBACK_COLUMNS) {
        Err(StoreError::MissingColumn { .. }) => return Err(ValidationError::FeedbackSchema.into()),
        other => other?,
    };
    let context = page(&current.session, "Feedback Data", json!({ "table": table }));
    state.render("feedback_list", &context)
}

/// Editor page for the session behind `current`.
///
/// Sends the browser back to the login page if the session has ended since
/// the request was extracted.
fn render_editor(
    state: &AppState,
    current: &CurrentSession,
    notice: Option<&str>,
    error: Option<&str>,
) -> Result<Response, AppError> {
    let mut extra = json!({ "notice": notice, "error": error });

    if current.session.editor_unlocked {
        let table = display_table(&state.applicants()?);
        let rows: Vec<Value> = table
            .rows
            .into_iter()
            .enumerate()
            .map(|(r, row)| {
                let cells: Vec<Value> = row
                    .into_iter()
                    .enumerate()
                    .map(|(c, value)| json!({"name": format!("cell.{}.{}", r, c), "value": value}))
                    .collect();
                json!({"index": r, "cells": cells})
            })
            .collect();
        extra["unlocked"] = json!(true);
        extra["columns"] = json!(APPLICANT_COLUMNS);
        extra["row_count"] = json!(rows.len());
        extra["rows"] = json!(rows);
    } else {
        let Some(code) = state.sessions.update(&current.id, |s| s.editor_code()) else {
            return Ok(Redirect::to("/").into_response());
        };
        extra["code"] = json!(code);
    }

    let html = state.render("edit", &page(&current.session, "Edit Existing Data", extra))?;
    Ok(html.into_response())
}

async fn serve_editor(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Result<Response, AppError> {
    render_editor(&state, &current, None, None)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UnlockForm {
    code: String,
}

async fn unlock_editor(
    State(state): State<Arc<AppState>>,
    mut current: CurrentSession,
    Form(form): Form<UnlockForm>,
) -> Result<Response, AppError> {
    let Some(outcome) = state.sessions.update(&current.id, |s| {
        s.unlock_editor(&form.code).map(|_| s.clone())
    }) else {
        return Ok(Redirect::to("/").into_response());
    };

    match outcome {
        Ok(session) => {
            info!("'{}' unlocked the editor", session.username);
            current.session = session;
            render_editor(&state, &current, None, None)
        }
        Err(e) => {
            let message = if form.code.trim().is_empty() {
                "Please enter a 6-digit code.".to_string()
            } else {
                e.to_string()
            };
            let mut response = render_editor(&state, &current, None, Some(&message))?;
            if response.status() == StatusCode::OK {
                *response.status_mut() = StatusCode::UNPROCESSABLE_ENTITY;
            }
            Ok(response)
        }
    }
}

/// Rebuild the whole applicant table from the editor form.
///
/// Cells arrive as `cell.<row>.<col>`; `rows` says how many rows were shown
/// and every `delete` value names a row to drop.
fn table_from_editor(fields: &[(String, String)]) -> Table {
    let mut cells: HashMap<(usize, usize), String> = HashMap::new();
    let mut deleted: BTreeSet<usize> = BTreeSet::new();
    let mut row_count = 0usize;

    for (key, value) in fields {
        match key.as_str() {
            "rows" => row_count = value.trim().parse().unwrap_or(0),
            "delete" => {
                if let Ok(r) = value.trim().parse() {
                    deleted.insert(r);
                }
            }
            _ => {
                let mut parts = key.strip_prefix("cell.").unwrap_or_default().split('.');
                if let (Some(Ok(r)), Some(Ok(c))) = (
                    parts.next().map(str::parse::<usize>),
                    parts.next().map(str::parse::<usize>),
                ) {
                    if c < APPLICANT_COLUMNS.len() {
                        cells.insert((r, c), value.replace("\r\n", "\n"));
                    }
                }
            }
        }
    }

    let rows = (0..row_count)
        .filter(|r| !deleted.contains(r))
        .map(|r| {
            (0..APPLICANT_COLUMNS.len())
                .map(|c| cells.remove(&(r, c)).unwrap_or_default())
                .collect()
        })
        .collect();

    Table::with_rows(&APPLICANT_COLUMNS, rows)
}

async fn save_editor(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    if !current.session.editor_unlocked {
        return Err(AppError::Forbidden);
    }
    let table = table_from_editor(&fields);
    state.store.update(APPLICANTS_WORKSHEET, &table)?;
    info!(
        "'{}' overwrote the applicant table with {} rows",
        current.session.username,
        table.len()
    );
    render_editor(&state, &current, Some("Data updated successfully!"), None)
}

async fn finish_editor(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Redirect {
    state.sessions.update(&current.id, Session::finish_editing);
    Redirect::to("/edit")
}

fn editor_table(state: &AppState, current: &CurrentSession) -> Result<Table, AppError> {
    if !current.session.editor_unlocked {
        return Err(AppError::Forbidden);
    }
    Ok(display_table(&state.applicants()?))
}

async fn download_all_csv(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Result<Response, AppError> {
    let table = editor_table(&state, &current)?;
    Ok(attachment(
        to_csv(&table),
        "text/csv; charset=utf-8",
        "APPLICANT DATA.csv",
    ))
}

async fn download_all_xlsx(
    State(state): State<Arc<AppState>>,
    current: CurrentSession,
) -> Result<Response, AppError> {
    let table = editor_table(&state, &current)?;
    let bytes = to_xlsx(&table, APPLICANTS_WORKSHEET).map_err(|e| AppError::Export(e.to_string()))?;
    Ok(attachment(
        bytes,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "APPLICANT DATA.xlsx",
    ))
}
