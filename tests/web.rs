#![cfg(feature = "web")]

use ams::app::{AppState, build_router};
use ams::config::{Role, UserEntry};
use ams::error::StoreError;
use ams::login::{SESSION_COOKIE, hash_password};
use ams::mailer::{FeedbackNotifier, MailError};
use ams::record::{APPLICANT_COLUMNS, APPLICANTS_WORKSHEET, FEEDBACK_COLUMNS, FEEDBACK_WORKSHEET};
use ams::{FeedbackRecord, MemoryStore, SheetStore, Table};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const PASSWORD: &str = "s3cret";

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<FeedbackRecord>>,
}

impl FeedbackNotifier for RecordingNotifier {
    fn notify(&self, feedback: &FeedbackRecord) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(feedback.clone());
        Ok(())
    }
}

/// Store that is never reachable
struct DownStore;

impl SheetStore for DownStore {
    fn read(&self, _: &str, _: &[&str]) -> ams::error::Result<Table> {
        Err(StoreError::Connection("sheet service offline".to_string()))
    }

    fn update(&self, _: &str, _: &Table) -> ams::error::Result<()> {
        Err(StoreError::Connection("sheet service offline".to_string()))
    }
}

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
}

fn users() -> Vec<UserEntry> {
    let hash = hash_password(PASSWORD).unwrap();
    vec![
        UserEntry {
            username: "clerk".to_string(),
            password_hash: hash.clone(),
            role: Role::Clerk,
        },
        UserEntry {
            username: "dev".to_string(),
            password_hash: hash,
            role: Role::Maintainer,
        },
    ]
}

fn applicant(date: &str, name: &str, position: &str) -> Vec<String> {
    let mut row = vec![String::new(); APPLICANT_COLUMNS.len()];
    row[0] = date.to_string();
    row[1] = date.replace("\n(ONLINE)", "");
    row[2] = name.to_string();
    row[3] = "0917,123,4567".to_string();
    row[4] = position.to_string();
    row[5] = "CHRMO".to_string();
    row[9] = "30".to_string();
    row[10] = "MALE".to_string();
    row
}

/// Notifier whose mail relay always refuses the message
struct RefusingNotifier;

impl FeedbackNotifier for RefusingNotifier {
    fn notify(&self, _: &FeedbackRecord) -> Result<(), MailError> {
        let bad = "no-at-sign".parse::<lettre::Address>().unwrap_err();
        Err(MailError::Address(bad))
    }
}

fn test_app(rows: Vec<Vec<String>>) -> TestApp {
    app_with_store(MemoryStore::new().with_table(
        APPLICANTS_WORKSHEET,
        Table::with_rows(&APPLICANT_COLUMNS, rows),
    ))
}

fn app_with_store(store: MemoryStore) -> TestApp {
    let store = Arc::new(store);
    let notifier = Arc::new(RecordingNotifier::default());
    let state = Arc::new(
        AppState::new(store.clone(), users(), Some(notifier.clone() as Arc<dyn FeedbackNotifier>))
            .unwrap(),
    );
    TestApp {
        router: build_router(state.clone()),
        state,
        store,
        notifier,
    }
}

fn seeded() -> TestApp {
    test_app(vec![
        applicant("03/04/2024", "JUAN DELA CRUZ", "ENGINEER I"),
        applicant("03/05/2024", "MARIA SANTOS", "NURSE"),
        applicant("03/05/2024\n(ONLINE)", "PEDRO REYES", "ENGINEER I"),
    ])
}

async fn send(app: &TestApp, request: Request<Body>) -> Response {
    app.router.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, cookie: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// Log in and return the `Cookie` header value for the new session
async fn login(app: &TestApp, username: &str) -> String {
    let response = send(
        app,
        post("/login", "", &format!("username={}&password={}", username, PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    set_cookie.split(';').next().unwrap().to_string()
}

fn session_id(cookie: &str) -> &str {
    cookie.split_once('=').unwrap().1
}

#[tokio::test]
async fn login_page_shown_without_session() {
    let app = seeded();
    let response = send(&app, get("/", "")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("To continue, please log in."));
}

#[tokio::test]
async fn bad_credentials_go_back_to_login() {
    let app = seeded();
    let response = send(&app, post("/login", "", "username=clerk&password=wrong")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/?error="));
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let response = send(&app, get(location(&response).to_string().as_str(), "")).await;
    assert!(body_text(response).await.contains("Please check your credentials"));
}

#[tokio::test]
async fn pages_require_a_session() {
    let app = seeded();
    for uri in ["/search", "/history", "/analytics", "/feedback", "/edit"] {
        let response = send(&app, get(uri, "session=not-a-session")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), "/");
    }
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = seeded();
    let cookie = login(&app, "clerk").await;
    assert_eq!(send(&app, get("/history", &cookie)).await.status(), StatusCode::OK);

    let response = send(&app, post("/logout", &cookie, "")).await;
    assert_eq!(location(&response), "/");
    assert!(app.state.sessions.get(session_id(&cookie)).is_none());
    assert_eq!(send(&app, get("/history", &cookie)).await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn submitting_an_applicant_appends_a_row() {
    let app = seeded();
    let cookie = login(&app, "clerk").await;
    let form = "online=on&date=2024-03-06&date_submitted=2024-03-01&name=ANA+LIM\
                &contact_number=09171234567&birthday_or_age=01%2F15%2F1990&gender=FEMALE";
    let response = send(&app, post("/applicants", &cookie, form)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Data Successfully Submitted."));

    let table = app.store.snapshot(APPLICANTS_WORKSHEET).unwrap();
    assert_eq!(table.len(), 4);
    let row = &table.rows[3];
    assert_eq!(row[0], "03/06/2024\n(ONLINE)");
    assert_eq!(row[1], "03/01/2024");
    assert_eq!(row[2], "ANA LIM");
    assert_eq!(row[4], "ANY VACANT POSITION");
    assert_eq!(row[5], "CHRMO");
    assert!(!row[9].is_empty());
    assert_eq!(row[10], "FEMALE");
}

#[tokio::test]
async fn missing_required_field_writes_nothing() {
    let app = seeded();
    let cookie = login(&app, "clerk").await;
    let response = send(
        &app,
        post("/applicants", &cookie, "date=2024-03-06&date_submitted=2024-03-01&name="),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Please fill in all required fields."));
    assert_eq!(app.store.snapshot(APPLICANTS_WORKSHEET).unwrap().len(), 3);
}

#[tokio::test]
async fn name_search_is_case_insensitive() {
    let app = seeded();
    let cookie = login(&app, "clerk").await;
    let body = body_text(send(&app, get("/search?by=name&q=maria", &cookie)).await).await;
    assert!(body.contains("MARIA SANTOS"));
    assert!(!body.contains("PEDRO REYES"));
    assert!(body.contains("09171234567"));
    assert!(body.contains("Download Report"));
}

#[tokio::test]
async fn search_without_results_says_so() {
    let app = seeded();
    let cookie = login(&app, "clerk").await;
    let body = body_text(send(&app, get("/search?by=name&q=nobody", &cookie)).await).await;
    assert!(body.contains("No results found."));
    assert!(!body.contains("Download Report"));
}

#[tokio::test]
async fn year_out_of_range_rejected() {
    let app = seeded();
    let cookie = login(&app, "clerk").await;
    let response = send(&app, get("/search?by=year&year=1999", &cookie)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Year must be between 2023 and 2050."));
}

#[tokio::test]
async fn daily_report_download_is_filtered_csv() {
    let app = seeded();
    let cookie = login(&app, "clerk").await;
    let response = send(
        &app,
        get("/search/download?by=date&date=2024-03-05&filter=walk-in", &cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.contains("03-05-2024.csv"));

    let csv = body_text(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert!(lines[0].ends_with("REMARKS"));
    assert!(!lines[0].contains("GENDER"));
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("1,03/05/2024,"));
    assert!(lines[1].contains("MARIA SANTOS"));
}

#[tokio::test]
async fn history_shows_latest_ten() {
    let rows = (1..=12)
        .map(|i| applicant("03/05/2024", &format!("APPLICANT {:02}", i), "CLERK"))
        .collect();
    let app = test_app(rows);
    let cookie = login(&app, "clerk").await;
    let body = body_text(send(&app, get("/history?filter=all", &cookie)).await).await;
    assert!(!body.contains("APPLICANT 01"));
    assert!(!body.contains("APPLICANT 02"));
    assert!(body.contains("APPLICANT 03"));
    assert!(body.contains("APPLICANT 12"));

    let body = body_text(send(&app, get("/history?filter=online", &cookie)).await).await;
    assert!(body.contains("No entries found."));
}

#[tokio::test]
async fn analytics_lists_counts_per_day() {
    let app = seeded();
    let cookie = login(&app, "clerk").await;
    let body = body_text(send(&app, get("/analytics", &cookie)).await).await;
    assert!(body.contains("/analytics/chart.svg"));
    assert!(body.contains("<td>03/05/2024</td><td>2</td>"));
}

#[tokio::test]
async fn editor_unlocks_saves_and_locks_again() {
    let app = seeded();
    let cookie = login(&app, "clerk").await;
    let id = session_id(&cookie).to_string();

    let locked = send(&app, get("/edit/download.csv", &cookie)).await;
    assert_eq!(locked.status(), StatusCode::FORBIDDEN);

    let body = body_text(send(&app, get("/edit", &cookie)).await).await;
    let code = app.state.sessions.get(&id).unwrap().editor_code.unwrap();
    assert!(body.contains(&code.to_string()));

    let wrong = if code == 999_999 { 100_000 } else { code + 1 };
    let response = send(&app, post("/edit/unlock", &cookie, &format!("code={}", wrong))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Incorrect code"));

    let response = send(&app, post("/edit/unlock", &cookie, &format!("code={}", code))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Update and Save"));

    let csv = body_text(send(&app, get("/edit/download.csv", &cookie)).await).await;
    assert!(csv.starts_with("DATE,DATE SUBMITTED,NAME,"));
    assert!(csv.contains("\"03/05/2024\n(ONLINE)\""));
    assert_eq!(csv.matches("09171234567").count(), 3);

    // Rename row 0 and delete row 1; row 2 is resubmitted unchanged
    let mut form = vec!["rows=3".to_string(), "delete=1".to_string()];
    for (r, name) in [(0, "JUAN D. CRUZ"), (1, "MARIA SANTOS"), (2, "PEDRO REYES")] {
        form.push(format!("cell.{}.0=03%2F04%2F2024", r));
        form.push(format!("cell.{}.2={}", r, urlencoding::encode(name)));
    }
    let response = send(&app, post("/edit/save", &cookie, &form.join("&"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Data updated successfully!"));

    let table = app.store.snapshot(APPLICANTS_WORKSHEET).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows[0][2], "JUAN D. CRUZ");
    assert_eq!(table.rows[1][2], "PEDRO REYES");

    send(&app, post("/edit/finish", &cookie, "")).await;
    let session = app.state.sessions.get(&id).unwrap();
    assert!(!session.editor_unlocked);
    assert!(session.editor_code.is_none());
    let response = send(&app, post("/edit/save", &cookie, "rows=0")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.store.snapshot(APPLICANTS_WORKSHEET).unwrap().len(), 2);
}

#[tokio::test]
async fn feedback_is_stored_and_mailed() {
    let app = seeded();
    let cookie = login(&app, "clerk").await;
    let response = send(
        &app,
        post("/feedback", &cookie, "user=clerk&title=Slow+search&description=Takes+a+while"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Feedback Submitted Successfully."));
    assert!(body.contains("The developer has been notified"));

    let table = app.store.snapshot(FEEDBACK_WORKSHEET).unwrap();
    assert_eq!(table.columns, FEEDBACK_COLUMNS);
    assert_eq!(table.rows[0][..3], ["clerk", "Slow search", "Takes a while"]);

    let sent = app.notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Slow search");
}

#[tokio::test]
async fn feedback_needs_title_and_description() {
    let app = seeded();
    let cookie = login(&app, "clerk").await;
    let response = send(&app, post("/feedback", &cookie, "user=clerk&title=Only+a+title")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.store.snapshot(FEEDBACK_WORKSHEET).is_none());
    assert!(app.notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn feedback_list_is_for_maintainers() {
    let app = seeded();
    let clerk = login(&app, "clerk").await;
    send(&app, post("/feedback", &clerk, "user=clerk&title=Hello&description=World")).await;
    let response = send(&app, get("/feedback/all", &clerk)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let dev = login(&app, "dev").await;
    let response = send(&app, get("/", &dev)).await;
    assert_eq!(location(&response), "/feedback/all");
    let body = body_text(send(&app, get("/feedback/all", &dev)).await).await;
    assert!(body.contains("<td>Hello</td>"));
    assert!(body.contains("<td>World</td>"));
}

#[tokio::test]
async fn unreachable_store_is_reported() {
    let state = Arc::new(AppState::new(Arc::new(DownStore), users(), None).unwrap());
    let app = TestApp {
        router: build_router(state.clone()),
        state,
        store: Arc::new(MemoryStore::new()),
        notifier: Arc::new(RecordingNotifier::default()),
    };
    let cookie = login(&app, "clerk").await;

    let body = body_text(send(&app, get("/", &cookie)).await).await;
    assert!(body.contains("Cannot connect to the sheet store"));

    let response = send(&app, get("/search?by=name&q=x", &cookie)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = send(
        &app,
        post("/applicants", &cookie, "date=2024-03-06&date_submitted=2024-03-01&name=X"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unchanged_editor_save_keeps_hand_typed_cells() {
    let mut row = applicant("03/05/2024", "ANA LIM", "CLERK");
    row[3] = "09171234567".to_string();
    row[9] = "N/A".to_string();
    row[10] = "F".to_string();
    let app = test_app(vec![row.clone()]);
    let cookie = login(&app, "clerk").await;

    send(&app, get("/edit", &cookie)).await;
    let code = app.state.sessions.get(session_id(&cookie)).unwrap().editor_code.unwrap();
    let body = body_text(send(&app, post("/edit/unlock", &cookie, &format!("code={}", code))).await).await;
    assert!(body.contains(">N/A</textarea>"));
    assert!(body.contains(">F</textarea>"));

    let csv = body_text(send(&app, get("/edit/download.csv", &cookie)).await).await;
    assert!(csv.contains(",N/A,F,"));

    // Post every cell back exactly as displayed
    let mut form = vec!["rows=1".to_string()];
    for (c, value) in row.iter().enumerate() {
        form.push(format!("cell.0.{}={}", c, urlencoding::encode(value)));
    }
    let response = send(&app, post("/edit/save", &cookie, &form.join("&"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.snapshot(APPLICANTS_WORKSHEET).unwrap().rows, vec![row]);
}

#[tokio::test]
async fn feedback_kept_when_mail_fails() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RefusingNotifier) as Arc<dyn FeedbackNotifier>;
    let state = Arc::new(AppState::new(store.clone(), users(), Some(notifier)).unwrap());
    let app = TestApp {
        router: build_router(state.clone()),
        state,
        store,
        notifier: Arc::new(RecordingNotifier::default()),
    };
    let cookie = login(&app, "clerk").await;

    let response = send(
        &app,
        post("/feedback", &cookie, "user=clerk&title=Typo&description=On+the+form"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Feedback Submitted Successfully."));
    assert!(body.contains("The notification email could not be sent."));
    assert!(!body.contains("The developer has been notified"));

    let table = app.store.snapshot(FEEDBACK_WORKSHEET).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows[0][1], "Typo");
}

#[tokio::test]
async fn feedback_sheet_with_other_columns_is_left_alone() {
    let existing = Table::with_rows(
        &["User", "Title", "Description"],
        vec![vec!["ana".to_string(), "Old".to_string(), "Earlier note".to_string()]],
    );
    let app = app_with_store(MemoryStore::new().with_table(FEEDBACK_WORKSHEET, existing.clone()));
    let cookie = login(&app, "clerk").await;

    let response = send(
        &app,
        post("/feedback", &cookie, "user=clerk&title=New&description=Another+note"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains(
        "Column names of new feedback data do not match existing feedback data."
    ));
    assert_eq!(app.store.snapshot(FEEDBACK_WORKSHEET).unwrap(), existing);
    assert!(app.notifier.sent.lock().unwrap().is_empty());
}
