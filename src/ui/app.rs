// Main TUI application using ratatui
// Owns every piece of UI-visible state, starts the background workers and
// applies their messages once per frame

use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste,
        EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, widgets::ListState, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::draw;
use super::input::UrlInput;
use crate::config::AppConfig;
use crate::player::BackgroundPlayer;
use crate::worker::{
    channel, download_videos, fetch_videos, CancelSignal, Message, MessageReceiver,
    MessageSender, WorkerSlot,
};
use crate::youtube::{Downloader, Extractor, VideoDescriptor};

const VOLUME_STEP: f32 = 0.05;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);
/// Rows per list entry: title line plus details line.
pub const LIST_ITEM_HEIGHT: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Url,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Fetch,
    Download,
    Cancel,
    PlayBackground,
    StopBackground,
    VolumeUp,
    VolumeDown,
    ToggleSelected,
    ToggleAll,
    CursorUp,
    CursorDown,
    OpenFolder,
    FocusUrl,
    FocusList,
    Quit,
}

/// Which actions are currently available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub fetch: bool,
    pub download: bool,
    pub cancel: bool,
}

pub struct App {
    config: AppConfig,
    extractor: Arc<dyn Extractor>,
    downloader: Arc<dyn Downloader>,
    pub(super) input: UrlInput,
    pub(super) focus: Focus,
    pub(super) videos: Vec<VideoDescriptor>,
    pub(super) list_state: ListState,
    // Where the list was drawn last frame, for mouse hit testing.
    pub(super) list_area: Rect,
    pub(super) status: String,
    pub(super) progress: String,
    pub(super) background: BackgroundPlayer,
    fetch_worker: WorkerSlot,
    download_worker: WorkerSlot,
    cancel_download: CancelSignal,
    // Set only on exit; lets a long playlist fetch stop early.
    shutdown: CancelSignal,
    pub(super) tx: MessageSender,
    rx: MessageReceiver,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: AppConfig,
        extractor: Arc<dyn Extractor>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        let (tx, rx) = channel();
        let background =
            BackgroundPlayer::new(&config.background_video, &config.ffmpeg, config.volume);

        App {
            config,
            extractor,
            downloader,
            input: UrlInput::new(),
            focus: Focus::Url,
            videos: Vec::new(),
            list_state: ListState::default(),
            list_area: Rect::default(),
            status: "Ready".to_string(),
            progress: String::new(),
            background,
            fetch_worker: WorkerSlot::new("fetch"),
            download_worker: WorkerSlot::new("download"),
            cancel_download: CancelSignal::new(),
            shutdown: CancelSignal::new(),
            tx,
            rx,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        )?;
        terminal.show_cursor()?;

        self.shutdown().await;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let frame_time = self.config.frame_time();

        loop {
            let frame_start = Instant::now();

            while event::poll(Duration::ZERO)? {
                let event = event::read()?;
                self.handle_event(event);
            }
            if self.should_quit {
                return Ok(());
            }

            self.pump_messages();
            terminal.draw(|frame| draw::render(frame, self))?;

            // Sleep out the rest of the frame, waking early for input.
            let remaining = frame_time.saturating_sub(frame_start.elapsed());
            if !remaining.is_zero() {
                event::poll(remaining)?;
            }
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn controls(&self) -> Controls {
        let downloading = self.download_worker.is_active();
        Controls {
            fetch: !self.input.trimmed().is_empty(),
            download: !self.videos.is_empty() && !downloading,
            cancel: downloading,
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.fetch_worker.is_active()
    }

    pub fn download_dir(&self) -> &std::path::Path {
        &self.config.download_dir
    }

    pub fn selected_count(&self) -> usize {
        self.videos.iter().filter(|v| v.selected).count()
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Paste(text) => {
                self.focus = Focus::Url;
                self.input.insert_str(&text);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        // Some terminals report releases too.
        if key.kind == KeyEventKind::Release {
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.dispatch(Action::Quit);
            return;
        }

        match self.focus {
            Focus::Url => match key.code {
                KeyCode::Enter => self.dispatch(Action::Fetch),
                KeyCode::Tab | KeyCode::Esc => self.dispatch(Action::FocusList),
                KeyCode::Char('u') if ctrl => self.input.clear(),
                KeyCode::Char(c) if !ctrl => self.input.insert(c),
                KeyCode::Backspace => self.input.backspace(),
                KeyCode::Delete => self.input.delete(),
                KeyCode::Left => self.input.left(),
                KeyCode::Right => self.input.right(),
                KeyCode::Home => self.input.home(),
                KeyCode::End => self.input.end(),
                _ => {}
            },
            Focus::List => {
                if let Some(action) = list_action(key.code) {
                    self.dispatch(action);
                }
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let inner = Rect {
            x: self.list_area.x.saturating_add(1),
            y: self.list_area.y.saturating_add(1),
            width: self.list_area.width.saturating_sub(2),
            height: self.list_area.height.saturating_sub(2),
        };
        let inside = mouse.column >= inner.x
            && mouse.column < inner.x + inner.width
            && mouse.row >= inner.y
            && mouse.row < inner.y + inner.height;
        if !inside {
            return;
        }

        match mouse.kind {
            MouseEventKind::ScrollDown => self.dispatch(Action::CursorDown),
            MouseEventKind::ScrollUp => self.dispatch(Action::CursorUp),
            MouseEventKind::Down(MouseButton::Left) => {
                self.focus = Focus::List;
                let row = (mouse.row - inner.y) / LIST_ITEM_HEIGHT;
                let index = self.list_state.offset() + row as usize;
                if index < self.videos.len() {
                    self.list_state.select(Some(index));
                    self.toggle_selected(index);
                }
            }
            _ => {}
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Fetch => {
                self.request_fetch();
            }
            Action::Download => {
                self.request_download();
            }
            Action::Cancel => self.request_cancel(),
            Action::PlayBackground => {
                if !self.background.start() {
                    self.status = format!(
                        "No background video at {}",
                        self.config.background_video.display()
                    );
                }
            }
            Action::StopBackground => self.background.stop(),
            Action::VolumeUp => self
                .background
                .set_volume(self.background.volume() + VOLUME_STEP),
            Action::VolumeDown => self
                .background
                .set_volume(self.background.volume() - VOLUME_STEP),
            Action::ToggleSelected => {
                if let Some(index) = self.list_state.selected() {
                    self.toggle_selected(index);
                }
            }
            Action::ToggleAll => {
                let select = self.videos.iter().any(|v| !v.selected);
                for video in &mut self.videos {
                    video.selected = select;
                }
            }
            Action::CursorUp => self.move_cursor(-1),
            Action::CursorDown => self.move_cursor(1),
            Action::OpenFolder => self.open_download_dir(),
            Action::FocusUrl => self.focus = Focus::Url,
            Action::FocusList => self.focus = Focus::List,
            Action::Quit => self.should_quit = true,
        }
    }

    /// Starts a fetch for the current URL unless one is already running.
    pub fn request_fetch(&mut self) -> bool {
        let url = self.input.trimmed().to_string();
        if url.is_empty() || self.fetch_worker.is_active() {
            return false;
        }

        let extractor = Arc::clone(&self.extractor);
        let settings = self.config.fetch_settings();
        let tx = self.tx.clone();
        let shutdown = self.shutdown.clone();

        self.fetch_worker.try_spawn(move || {
            fetch_videos(extractor.as_ref(), &url, &settings, &tx, &shutdown);
        })
    }

    /// Starts downloading the selected videos unless a download is running.
    pub fn request_download(&mut self) -> bool {
        if self.videos.is_empty() || self.download_worker.is_active() {
            return false;
        }
        if self.selected_count() == 0 {
            self.tx.status("No videos selected");
            return false;
        }

        self.cancel_download.clear();
        let downloader = Arc::clone(&self.downloader);
        let videos = self.videos.clone();
        let settings = self.config.download_settings();
        let tx = self.tx.clone();
        let cancel = self.cancel_download.clone();

        self.download_worker.try_spawn(move || {
            download_videos(downloader.as_ref(), &videos, &settings, &tx, &cancel);
        })
    }

    pub fn request_cancel(&mut self) {
        self.cancel_download.set();
    }

    pub fn toggle_selected(&mut self, index: usize) {
        if let Some(video) = self.videos.get_mut(index) {
            video.selected = !video.selected;
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.videos.is_empty() {
            self.list_state.select(None);
            return;
        }
        let last = self.videos.len() - 1;
        let current = self.list_state.selected().unwrap_or(0);
        let next = if delta < 0 {
            current.saturating_sub(delta.unsigned_abs())
        } else {
            (current + delta as usize).min(last)
        };
        self.list_state.select(Some(next));
    }

    fn open_download_dir(&mut self) {
        let dir = self.config.download_dir.clone();
        let tx = self.tx.clone();
        // Launchers can block until the file manager is up.
        std::thread::spawn(move || {
            let result = std::fs::create_dir_all(&dir).and_then(|_| open::that(&dir));
            if let Err(e) = result {
                tracing::warn!(dir = %dir.display(), error = %e, "could not open download folder");
                tx.status(format!("Could not open {}: {}", dir.display(), e));
            }
        });
    }

    /// Applies everything the workers posted since the last frame.
    pub fn pump_messages(&mut self) -> usize {
        let messages = self.rx.drain_all();
        let count = messages.len();
        for message in messages {
            self.apply(message);
        }
        count
    }

    fn apply(&mut self, message: Message) {
        match message {
            Message::Status(text) => self.status = text,
            Message::Progress(text) => self.progress = text,
            Message::Result(videos) => {
                self.videos = videos;
                self.list_state = ListState::default();
                if !self.videos.is_empty() {
                    self.list_state.select(Some(0));
                }
            }
        }
    }

    /// Waits up to `grace` for each running worker.
    pub async fn wait_for_workers(&mut self, grace: Duration) -> bool {
        let fetch_done = self.fetch_worker.wait(grace).await;
        let download_done = self.download_worker.wait(grace).await;
        fetch_done && download_done
    }

    /// Signals every worker to stop and gives them a bounded time to finish.
    pub async fn shutdown(&mut self) {
        self.cancel_download.set();
        self.shutdown.set();
        self.background.stop();

        if !self.wait_for_workers(SHUTDOWN_GRACE).await {
            tracing::warn!("exiting with workers still running");
        }
    }
}

/// Key bindings while the list has focus.
fn list_action(code: KeyCode) -> Option<Action> {
    let action = match code {
        KeyCode::Up | KeyCode::Char('k') => Action::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => Action::CursorDown,
        KeyCode::Char(' ') | KeyCode::Enter => Action::ToggleSelected,
        KeyCode::Char('a') => Action::ToggleAll,
        KeyCode::Char('f') => Action::Fetch,
        KeyCode::Char('d') => Action::Download,
        KeyCode::Char('c') => Action::Cancel,
        KeyCode::Char('b') => Action::PlayBackground,
        KeyCode::Char('s') => Action::StopBackground,
        KeyCode::Char('+') | KeyCode::Char('=') => Action::VolumeUp,
        KeyCode::Char('-') => Action::VolumeDown,
        KeyCode::Char('o') => Action::OpenFolder,
        KeyCode::Tab | KeyCode::Char('/') => Action::FocusUrl,
        KeyCode::Char('q') => Action::Quit,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::{raw, FakeDownloader, FakeExtractor};
    use std::sync::{mpsc, Mutex};

    const WAIT: Duration = Duration::from_secs(5);

    fn config(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            download_dir: dir.join("downloads"),
            background_video: dir.join("missing-background.mp4"),
            ..AppConfig::default()
        }
    }

    fn app_with(
        dir: &std::path::Path,
        extractor: FakeExtractor,
        downloader: FakeDownloader,
    ) -> (App, Arc<FakeExtractor>, Arc<FakeDownloader>) {
        let extractor = Arc::new(extractor);
        let downloader = Arc::new(downloader);
        let app = App::new(config(dir), extractor.clone(), downloader.clone());
        (app, extractor, downloader)
    }

    fn idle_app(dir: &std::path::Path) -> App {
        let (app, _, _) = app_with(
            dir,
            FakeExtractor::single(raw("a", "A", 1.0)),
            FakeDownloader::new(),
        );
        app
    }

    fn video(id: &str, selected: bool) -> VideoDescriptor {
        VideoDescriptor {
            id: id.to_string(),
            title: id.to_uppercase(),
            duration: "0:10".to_string(),
            uploader: "Uploader".to_string(),
            url: format!("https://www.youtube.com/watch?v={}", id),
            thumbnail: String::new(),
            selected,
        }
    }

    fn type_url(app: &mut App, url: &str) {
        for c in url.chars() {
            app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)));
        }
    }

    #[test]
    fn starts_ready_with_nothing_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let app = idle_app(dir.path());

        assert_eq!(app.status, "Ready");
        assert_eq!(
            app.controls(),
            Controls {
                fetch: false,
                download: false,
                cancel: false
            }
        );
    }

    #[tokio::test]
    async fn fetch_replaces_list_and_enables_download() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _, _) = app_with(
            dir.path(),
            FakeExtractor::playlist(vec![raw("a", "A", 1.0), raw("b", "B", 2.0)]),
            FakeDownloader::new(),
        );
        app.videos = vec![video("old", true)];

        type_url(&mut app, "https://youtube.com/playlist?list=PL");
        assert!(app.controls().fetch);
        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));

        assert!(app.wait_for_workers(WAIT).await);
        app.pump_messages();

        let ids: Vec<_> = app.videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(app.videos.iter().all(|v| !v.selected));
        assert_eq!(app.list_state.selected(), Some(0));
        assert_eq!(app.status, "Successfully loaded 2 video(s)");
        assert!(app.controls().download);
    }

    #[tokio::test]
    async fn second_fetch_while_running_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _, _) = app_with(
            dir.path(),
            FakeExtractor::single(raw("a", "A", 1.0)).slow(Duration::from_millis(200)),
            FakeDownloader::new(),
        );
        type_url(&mut app, "https://youtu.be/a");

        assert!(app.request_fetch());
        assert!(app.is_fetching());
        assert!(!app.request_fetch());

        assert!(app.wait_for_workers(WAIT).await);
        let started = app
            .rx
            .drain_all()
            .into_iter()
            .filter(|m| *m == Message::Status("Fetching video information...".into()))
            .count();
        assert_eq!(started, 1);
    }

    #[test]
    fn empty_url_does_not_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = idle_app(dir.path());
        type_url(&mut app, "   ");
        assert!(!app.controls().fetch);
        assert!(!app.request_fetch());
        assert!(!app.is_fetching());
    }

    #[tokio::test]
    async fn download_with_nothing_selected_posts_one_status_and_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _, downloader) = app_with(
            dir.path(),
            FakeExtractor::single(raw("a", "A", 1.0)),
            FakeDownloader::new(),
        );
        app.videos = vec![video("a", false), video("b", false)];

        assert!(!app.request_download());
        assert!(!app.controls().cancel);
        assert_eq!(
            app.rx.drain_all(),
            vec![Message::Status("No videos selected".into())]
        );
        assert!(downloader.urls().is_empty());
    }

    #[tokio::test]
    async fn toggling_selection_drives_the_download() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _, downloader) = app_with(
            dir.path(),
            FakeExtractor::single(raw("a", "A", 1.0)),
            FakeDownloader::new(),
        );
        app.apply(Message::Result(vec![video("a", false), video("b", false), video("c", false)]));
        app.dispatch(Action::FocusList);

        // Cursor starts on the first item: select "a" and "c".
        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE)));
        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE)));
        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE)));
        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE)));
        assert_eq!(app.selected_count(), 2);

        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE)));
        assert!(app.wait_for_workers(WAIT).await);
        app.pump_messages();

        assert_eq!(
            downloader.urls(),
            vec![
                "https://www.youtube.com/watch?v=a",
                "https://www.youtube.com/watch?v=c"
            ]
        );
        assert_eq!(app.status, "Successfully downloaded 2 video(s)");
        assert_eq!(app.progress, "");
        assert!(app.controls().download);
    }

    #[tokio::test]
    async fn cancel_stops_remaining_items_and_stays_set() {
        let dir = tempfile::tempdir().unwrap();
        let (started_tx, started_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let started_tx = Mutex::new(started_tx);
        let release_rx = Mutex::new(release_rx);
        // The first item blocks until the test has pressed cancel.
        let downloader = FakeDownloader::new().on_download(move |index| {
            if index == 0 {
                let _ = started_tx.lock().unwrap().send(());
                let _ = release_rx.lock().unwrap().recv();
            }
        });
        let (mut app, _, downloader) = app_with(
            dir.path(),
            FakeExtractor::single(raw("a", "A", 1.0)),
            downloader,
        );
        app.videos = vec![video("a", true), video("b", true), video("c", true)];

        assert!(app.request_download());
        assert!(app.controls().cancel);
        assert!(!app.controls().download);
        assert!(!app.request_download());

        started_rx.recv_timeout(WAIT).unwrap();
        app.dispatch(Action::Cancel);
        release_tx.send(()).unwrap();
        assert!(app.wait_for_workers(WAIT).await);
        app.pump_messages();

        assert_eq!(downloader.urls().len(), 1);
        assert_eq!(app.status, "Download cancelled");
        assert!(app.cancel_download.is_set());
        assert!(!app.controls().cancel);

        // The next run clears the flag before starting.
        assert!(app.request_download());
        assert!(!app.cancel_download.is_set());
        assert!(app.wait_for_workers(WAIT).await);
        assert_eq!(downloader.urls().len(), 4);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_existing_list() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _, _) = app_with(
            dir.path(),
            FakeExtractor::failing("Connection timed out"),
            FakeDownloader::new(),
        );
        app.videos = vec![video("keep", false)];
        type_url(&mut app, "https://youtu.be/x");

        assert!(app.request_fetch());
        assert!(app.wait_for_workers(WAIT).await);
        app.pump_messages();

        assert_eq!(app.videos.len(), 1);
        assert_eq!(
            app.status,
            "Error: Request timed out. Check your internet connection."
        );
    }

    #[test]
    fn messages_apply_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = idle_app(dir.path());
        app.tx.status("first");
        app.tx.progress("working");
        app.tx.status("second");
        app.tx.progress("");

        assert_eq!(app.pump_messages(), 4);
        assert_eq!(app.status, "second");
        assert_eq!(app.progress, "");
        assert_eq!(app.pump_messages(), 0);
    }

    #[test]
    fn toggle_all_selects_then_clears() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = idle_app(dir.path());
        app.videos = vec![video("a", true), video("b", false)];

        app.dispatch(Action::ToggleAll);
        assert_eq!(app.selected_count(), 2);
        app.dispatch(Action::ToggleAll);
        assert_eq!(app.selected_count(), 0);
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = idle_app(dir.path());
        app.apply(Message::Result(vec![video("a", false), video("b", false)]));

        app.dispatch(Action::CursorUp);
        assert_eq!(app.list_state.selected(), Some(0));
        for _ in 0..5 {
            app.dispatch(Action::CursorDown);
        }
        assert_eq!(app.list_state.selected(), Some(1));

        app.apply(Message::Result(Vec::new()));
        assert_eq!(app.list_state.selected(), None);
        app.dispatch(Action::ToggleSelected);
    }

    #[test]
    fn mouse_click_toggles_item_under_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = idle_app(dir.path());
        app.apply(Message::Result(vec![video("a", false), video("b", false)]));
        app.list_area = Rect::new(0, 10, 40, 10);

        // Inner area starts at row 11; rows 13-14 belong to the second item.
        app.handle_event(Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 5,
            row: 13,
            modifiers: KeyModifiers::NONE,
        }));

        assert!(!app.videos[0].selected);
        assert!(app.videos[1].selected);
        assert_eq!(app.focus, Focus::List);
    }

    #[test]
    fn volume_keys_step_and_clamp() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = idle_app(dir.path());
        for _ in 0..30 {
            app.dispatch(Action::VolumeUp);
        }
        assert_eq!(app.background.volume(), 1.0);
        app.dispatch(Action::VolumeDown);
        assert!((app.background.volume() - 0.95).abs() < 1e-4);
    }

    #[test]
    fn play_without_background_file_reports_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = idle_app(dir.path());
        app.dispatch(Action::PlayBackground);
        assert!(app.status.starts_with("No background video at"));
        assert!(!app.background.is_playing());
    }

    #[test]
    fn paste_and_quit_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = idle_app(dir.path());
        app.dispatch(Action::FocusList);
        app.handle_event(Event::Paste("https://youtu.be/z\n".into()));
        assert_eq!(app.focus, Focus::Url);
        assert_eq!(app.input.text(), "https://youtu.be/z");

        // 'q' is text while typing a URL.
        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(!app.should_quit());
        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(app.should_quit());
    }

    #[tokio::test]
    async fn shutdown_signals_workers() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, _, _) = app_with(
            dir.path(),
            FakeExtractor::playlist((0..3).map(|i| raw(&format!("v{}", i), "t", 1.0)).collect())
                .slow(Duration::from_millis(100)),
            FakeDownloader::new(),
        );
        type_url(&mut app, "https://youtube.com/playlist?list=PL");
        assert!(app.request_fetch());

        app.shutdown().await;

        assert!(app.cancel_download.is_set());
        assert!(!app.is_fetching());
        // The playlist pass saw the shutdown flag before its first item.
        let posted_result = app
            .rx
            .drain_all()
            .iter()
            .any(|m| matches!(m, Message::Result(_)));
        assert!(!posted_result);
    }
}
