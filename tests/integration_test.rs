// Integration tests for account-users

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use account_users::app::keymap::Keymap;
use account_users::app::update::{Flow, dispatch, handle_key, handle_mouse};
use account_users::app::{AppState, InputMode, ModalState, Theme, UiAction};
use account_users::list::UserListState;
use account_users::remote::{LoadPoll, Role, UserFetcher, UserRecord, spawn_load};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn temp_path(tag: &str) -> String {
    let mut path = std::env::temp_dir();
    let nonce = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    path.push(format!("account_users_{tag}_{}_{}.conf", std::process::id(), nonce));
    path.to_string_lossy().to_string()
}

fn users(n: u64) -> Vec<UserRecord> {
    let roles = [Role::Admin, Role::Agent, Role::AccountManager, Role::ExternalReviewer];
    (1..=n)
        .map(|i| UserRecord {
            id: i,
            name: format!("U{i}"),
            email: format!("u{i}@example.com"),
            avatar: format!("https://avatars.example.com/{i}.png"),
            role: roles[(i as usize) % roles.len()],
        })
        .collect()
}

fn app_with(n: u64) -> AppState {
    AppState::from_parts(
        UserListState::with_users(25, users(n)),
        Theme::indigo(),
        Keymap::default(),
        Duration::from_millis(1000),
    )
}

fn key(app: &mut AppState, code: KeyCode, now: Instant) -> Flow {
    handle_key(app, KeyEvent::new(code, KeyModifiers::NONE), now)
}

fn click(app: &mut AppState, column: u16, row: u16) {
    handle_mouse(
        app,
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        },
    );
}

fn find_text(buf: &Buffer, needle: &str) -> Option<(u16, u16)> {
    let area = buf.area;
    for y in area.y..area.bottom() {
        let mut line = String::new();
        let mut columns = Vec::new();
        for x in area.x..area.right() {
            let symbol = buf[(x, y)].symbol();
            for _ in symbol.chars() {
                columns.push(x);
            }
            line.push_str(symbol);
        }
        if let Some(byte_idx) = line.find(needle) {
            let char_idx = line[..byte_idx].chars().count();
            return columns.get(char_idx).map(|x| (*x, y));
        }
    }
    None
}

fn draw(terminal: &mut Terminal<TestBackend>, app: &mut AppState) -> Buffer {
    terminal
        .draw(|f| account_users::ui::render(f, app))
        .expect("draw");
    terminal.backend().buffer().clone()
}

// 1) Theme config roundtrip and init
#[test]
fn theme_roundtrip_and_init() {
    let path = temp_path("theme");
    let t = Theme {
        accent: ratatui::style::Color::Blue,
        highlight_bg: ratatui::style::Color::Reset,
        ..Theme::indigo()
    };
    t.write_file(&path).expect("write theme");
    let t2 = Theme::from_file(&path).expect("read theme");
    assert_eq!(t2.accent, ratatui::style::Color::Indexed(4));
    assert_eq!(t2.highlight_bg, ratatui::style::Color::Reset);

    let t3 = Theme::indigo();
    t3.write_file(&path).expect("write theme");
    assert_eq!(Theme::from_file(&path), Some(t3));

    let init_path = temp_path("theme_init");
    let _ = std::fs::remove_file(&init_path);
    let _created = Theme::load_or_init(&init_path);
    assert!(std::path::Path::new(&init_path).exists());

    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(&init_path);
}

// 2) Keymap survives being written and read back
#[test]
fn keymap_roundtrip() {
    let path = temp_path("keys");
    let km = Keymap::parse("Reload = Ctrl+r\n");
    km.write_file(&path).expect("write keymap");
    let back = Keymap::from_file(&path).expect("read keymap");
    let mut a = km.all_bindings();
    let mut b = back.all_bindings();
    let sort_key = |e: &((KeyModifiers, KeyCode), account_users::app::keymap::KeyAction)| {
        (Keymap::format_key(e.0.0, e.0.1), e.1)
    };
    a.sort_by_key(sort_key);
    b.sort_by_key(sort_key);
    assert_eq!(a, b);
    let _ = std::fs::remove_file(&path);
}

// 3) Selection survives paging, driven through keys
#[test]
fn selection_persists_across_pages_via_keys() {
    let mut app = app_with(30);
    let now = Instant::now();
    key(&mut app, KeyCode::Down, now);
    key(&mut app, KeyCode::Down, now);
    key(&mut app, KeyCode::Char(' '), now); // U3
    key(&mut app, KeyCode::Down, now);
    key(&mut app, KeyCode::Down, now);
    key(&mut app, KeyCode::Char(' '), now); // U5
    assert_eq!(app.list.selected_count(), 2);

    key(&mut app, KeyCode::Right, now);
    assert_eq!(app.list.current_page(), 2);
    assert_eq!(app.list.visible().len(), 5);
    assert_eq!(app.list.selected_count(), 2);

    key(&mut app, KeyCode::Left, now);
    assert!(app.list.is_selected(3));
    assert!(app.list.is_selected(5));
}

// 4) Select-all only covers the page it was used on
#[test]
fn select_all_checkbox_is_page_scoped() {
    let mut app = app_with(30);
    key(&mut app, KeyCode::Right, Instant::now());
    dispatch(&mut app, UiAction::ToggleSelectAll);
    assert!(app.list.select_all_checked);
    assert_eq!(app.list.selected_count(), 5);
    key(&mut app, KeyCode::Left, Instant::now());
    assert!(app.list.visible().iter().all(|u| !app.list.is_selected(u.id)));
    dispatch(&mut app, UiAction::ToggleSelectAll);
    assert!(!app.list.select_all_checked);
    assert_eq!(app.list.selected_count(), 0);
}

// 5) Rendering registers clickable regions that drive the same actions
#[test]
fn mouse_clicks_follow_rendered_buttons() {
    let mut terminal = Terminal::new(TestBackend::new(120, 40)).expect("terminal");
    let mut app = app_with(30);

    let buf = draw(&mut terminal, &mut app);
    assert!(find_text(&buf, "Account users").is_some());
    assert!(find_text(&buf, "0 users selected").is_some());
    assert!(find_text(&buf, "account manager").is_some());
    let (x, y) = find_text(&buf, "Next").expect("next button");
    click(&mut app, x, y);
    assert_eq!(app.list.current_page(), 2);

    let buf = draw(&mut terminal, &mut app);
    assert!(find_text(&buf, "U30").is_some());
    assert!(find_text(&buf, "Page 2 of 2").is_some());
    // Next is disabled on the last page: clicking it does nothing
    let (x, y) = find_text(&buf, "Next").expect("next button");
    click(&mut app, x, y);
    assert_eq!(app.list.current_page(), 2);

    let (x, y) = find_text(&buf, "Previous").expect("previous button");
    click(&mut app, x, y);
    assert_eq!(app.list.current_page(), 1);

    let buf = draw(&mut terminal, &mut app);
    let (x, y) = find_text(&buf, "Connect users").expect("connect button");
    click(&mut app, x, y);
    assert_eq!(app.input_mode, InputMode::Modal);
    assert!(matches!(app.modal, Some(ModalState::Info { .. })));

    let buf = draw(&mut terminal, &mut app);
    assert!(find_text(&buf, "is not available").is_some());
    click(&mut app, 0, 0);
    assert!(app.modal.is_none());
}

// 6) Search typed into the box shows the empty state once debounced
#[test]
fn debounced_search_renders_no_results() {
    let mut terminal = Terminal::new(TestBackend::new(120, 30)).expect("terminal");
    let mut app = app_with(30);
    let t0 = Instant::now();
    key(&mut app, KeyCode::Char('/'), t0);
    for c in "zzz".chars() {
        key(&mut app, KeyCode::Char(c), t0);
    }
    app.tick(t0 + Duration::from_millis(500));
    assert!(!app.list.no_results());
    assert!(app.next_wakeup(t0 + Duration::from_millis(500), Duration::from_millis(100)) <= Duration::from_millis(100));

    app.tick(t0 + Duration::from_millis(1000));
    assert!(app.list.no_results());
    let buf = draw(&mut terminal, &mut app);
    assert!(find_text(&buf, "No users match \"zzz\"").is_some());

    for _ in 0..3 {
        key(&mut app, KeyCode::Backspace, t0);
    }
    key(&mut app, KeyCode::Enter, t0);
    assert_eq!(app.list.query(), "");
    assert_eq!(app.list.visible().len(), 25);
}

async fn serve_once(status_line: &'static str, body: String) -> String {
    serve_after(Duration::ZERO, status_line, body).await
}

/// Answer a single request after holding it for `delay`.
async fn serve_after(delay: Duration, status_line: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            tokio::time::sleep(delay).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{addr}/klausTestData/db.json")
}

fn local_fetcher(url: String) -> UserFetcher {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("client");
    UserFetcher::with_client(url, client)
}

// 7) Fetch against a local HTTP endpoint
#[tokio::test]
async fn fetch_reads_users_from_endpoint() {
    let body = r#"{"users":[{"id":1,"name":"Ada","email":"ada@example.com","avatar":"https://a/1.png","role":"ADMIN"},{"id":2,"name":"Bo","email":"bo@example.com","avatar":"https://a/2.png","role":"EXTERNAL_REVIEWER"}]}"#;
    let url = serve_once("200 OK", body.to_string()).await;
    let fetched = local_fetcher(url).fetch().await.expect("fetch");
    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched[1].role, Role::ExternalReviewer);
}

// 8) Failures are swallowed into an empty list
#[tokio::test]
async fn fetch_failures_become_empty_list() {
    let url = serve_once("500 Internal Server Error", "{}".to_string()).await;
    let fetcher = local_fetcher(url);
    assert!(matches!(
        fetcher.fetch().await,
        Err(account_users::error::FetchError::Status { .. })
    ));

    let url = serve_once("200 OK", "not json".to_string()).await;
    assert!(local_fetcher(url).fetch_or_empty().await.is_empty());
}

// 9) Background load delivers into the app; a cancelled one never does
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_load_and_cancellation() {
    let body = r#"{"users":[{"id":7,"name":"Seven","email":"s@example.com","avatar":"","role":"AGENT"}]}"#;
    let url = serve_once("200 OK", body.to_string()).await;
    let handle = tokio::runtime::Handle::current();

    let mut app = AppState::from_parts(
        UserListState::new(25),
        Theme::indigo(),
        Keymap::default(),
        Duration::from_millis(1000),
    )
    .with_fetcher(local_fetcher(url));
    app.start_load(&handle);
    assert!(app.list.is_loading());
    let deadline = Instant::now() + Duration::from_secs(5);
    while app.list.is_loading() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
        app.tick(Instant::now());
    }
    assert!(!app.list.is_loading());
    assert_eq!(app.list.all().len(), 1);
    assert_eq!(app.list.all()[0].name, "Seven");

    // A listener that never answers keeps the load pending until cancelled
    let silent = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = silent.local_addr().expect("addr");
    let mut load = spawn_load(&handle, local_fetcher(format!("http://{addr}/db.json")));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(load.poll(), LoadPoll::Pending);
    load.cancel();
    assert!(load.is_cancelled());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(load.poll(), LoadPoll::Abandoned);
    drop(silent);
}

// 10) Reloading while a load is in flight keeps only the newest result
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reload_supersedes_in_flight_load() {
    let stale = r#"{"users":[{"id":1,"name":"Stale","email":"old@example.com","avatar":"","role":"ADMIN"}]}"#;
    let fresh = r#"{"users":[{"id":2,"name":"Fresh","email":"new@example.com","avatar":"","role":"AGENT"}]}"#;
    let slow_url = serve_after(Duration::from_millis(400), "200 OK", stale.to_string()).await;
    let fast_url = serve_once("200 OK", fresh.to_string()).await;
    let handle = tokio::runtime::Handle::current();

    let mut app = AppState::from_parts(
        UserListState::new(25),
        Theme::indigo(),
        Keymap::default(),
        Duration::from_millis(1000),
    )
    .with_fetcher(local_fetcher(slow_url));
    app.start_load(&handle);
    tokio::time::sleep(Duration::from_millis(50)).await;
    app.tick(Instant::now());
    assert!(app.list.is_loading());

    app.fetcher = Some(local_fetcher(fast_url));
    app.start_load(&handle);
    let deadline = Instant::now() + Duration::from_secs(5);
    while app.list.is_loading() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
        app.tick(Instant::now());
    }
    assert_eq!(app.list.all().len(), 1);
    assert_eq!(app.list.all()[0].name, "Fresh");

    // the slow answer would have arrived by now
    tokio::time::sleep(Duration::from_millis(600)).await;
    app.tick(Instant::now());
    assert!(app.pending_load.is_none());
    assert_eq!(app.list.all()[0].name, "Fresh");
}

// 11) Help scrolling stops once the last line is on screen
#[test]
fn help_scroll_is_bounded_by_content() {
    let mut app = app_with(3);
    let mut terminal = Terminal::new(TestBackend::new(80, 20)).expect("terminal");
    key(&mut app, KeyCode::Char('?'), Instant::now());
    draw(&mut terminal, &mut app);
    let max = app.help_scroll_max;
    assert!(max > 0);
    for _ in 0..200 {
        key(&mut app, KeyCode::Down, Instant::now());
        draw(&mut terminal, &mut app);
    }
    assert_eq!(app.modal, Some(ModalState::Help { scroll: max }));
    let buf = draw(&mut terminal, &mut app);
    assert!(find_text(&buf, "Close help").is_some());
}
