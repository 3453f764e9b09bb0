use std::{
    sync::mpsc::{self, Receiver, TryRecvError},
    time::Duration,
};

use eframe::egui::{self, Color32, RichText, TextEdit};
use retry_request::{
    page::{IndexPage, PageData, INDEX_URL},
    ClientOptions, MemoryNotifier, Notification, RequestClient, Result,
};

struct IndexPageApp {
    url: String,
    timeout_ms: String,
    page: IndexPage,
    notifier: MemoryNotifier,
    notifications: Vec<Notification>,
    status: String,
    in_flight: bool,
    rx: Option<Receiver<Result<PageData>>>,
}

impl Default for IndexPageApp {
    fn default() -> Self {
        Self {
            url: INDEX_URL.to_owned(),
            timeout_ms: "10000".to_owned(),
            page: IndexPage::new(),
            notifier: MemoryNotifier::new(),
            notifications: Vec::new(),
            status: "Ready".to_owned(),
            in_flight: false,
            rx: None,
        }
    }
}

impl eframe::App for IndexPageApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_response();
        if !self.page.is_mounted() && !self.in_flight {
            self.mount_async();
        }

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.heading("Index Page Demo");
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("URL");
                ui.add(TextEdit::singleline(&mut self.url).desired_width(500.0));
            });

            ui.horizontal(|ui| {
                ui.label("Timeout (ms)");
                ui.add(TextEdit::singleline(&mut self.timeout_ms).desired_width(80.0));
                if ui
                    .add_enabled(!self.in_flight, egui::Button::new("Remount"))
                    .clicked()
                {
                    self.page = IndexPage::with_url(self.url.trim());
                }
            });

            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("Status: {}", self.status)));
                if self.in_flight {
                    ui.spinner();
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let rendered = self.page.render();
            let mut lines = rendered.lines();
            if let Some(heading) = lines.next() {
                ui.heading(heading);
            }
            for line in lines {
                ui.label(line);
            }

            if !self.notifications.is_empty() {
                ui.separator();
                for notification in &self.notifications {
                    ui.colored_label(Color32::from_rgb(215, 40, 40), &notification.message);
                    ui.label(&notification.description);
                }
            }
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl IndexPageApp {
    fn mount_async(&mut self) {
        if !self.page.begin_mount() {
            return;
        }

        let url = self.page.url().to_owned();
        let timeout_ms = self.timeout_ms.trim().parse().unwrap_or(10_000);
        let notifier = self.notifier.clone();

        self.status = format!("Fetching {url}...");
        self.in_flight = true;
        self.notifications.clear();

        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);

        std::thread::spawn(move || {
            let response = run_fetch(url, timeout_ms, notifier);
            let _ = tx.send(response);
        });
    }

    fn poll_response(&mut self) {
        let Some(rx) = &self.rx else {
            return;
        };

        match rx.try_recv() {
            Ok(result) => {
                self.in_flight = false;
                self.rx = None;
                self.status = match &result {
                    Ok(_) => "Loaded".to_owned(),
                    Err(err) => format!("Failed: {err}"),
                };
                self.page.apply(result);
                self.notifications.extend(self.notifier.drain());
            }
            Err(TryRecvError::Disconnected) => {
                self.in_flight = false;
                self.rx = None;
                self.status = "Worker disconnected".to_owned();
            }
            Err(TryRecvError::Empty) => {}
        }
    }
}

fn run_fetch(url: String, timeout_ms: u64, notifier: MemoryNotifier) -> Result<PageData> {
    let client = RequestClient::with_options(ClientOptions::default().with_timeout_ms(timeout_ms))?
        .with_notifier(notifier);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| retry_request::RequestError::Config(format!("runtime init failed: {err}")))?;
    runtime.block_on(IndexPage::fetch(&client, &url))
}

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Index Page",
        options,
        Box::new(|_cc| Box::new(IndexPageApp::default())),
    )
}
