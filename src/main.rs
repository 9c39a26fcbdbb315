use iced::futures::channel::mpsc;
use iced::futures::{SinkExt, Stream};
use iced::widget::{button, checkbox, column, container, row, scrollable, text, text_input, Column};
use iced::{window, Color, Element, Font, Length, Size, Task, Theme};
use std::path::PathBuf;
use std::process::ExitCode;

mod color;
mod convert;
mod dialogs;
mod error;
mod logging;
mod raw;
mod scan;
mod state;

use convert::{ConversionEvent, ConversionJob, ConversionSummary};
use dialogs::{Level, Notice};
use raw::RawloaderDecoder;
use scan::FolderProblem;
use state::log::{is_error_line, LogBuffer};

/// Main application state
struct DngConverter {
    /// Folder field, editable by hand or filled by the picker
    folder: String,
    overwrite: bool,
    log: LogBuffer,
    /// A conversion is in flight; Convert is disabled meanwhile
    running: bool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    FolderChanged(String),
    BrowseFolder,
    OverwriteToggled(bool),
    Convert,
    /// Progress from the background conversion
    Progress(ConversionEvent),
    /// Background conversion finished (Err if the worker died)
    Finished(Result<ConversionSummary, String>),
    /// Open a message box once the log is on screen
    Notify(Notice),
}

impl DngConverter {
    fn new() -> (Self, Task<Message>) {
        tracing::info!("🎨 DNG to JPG Converter started");
        (
            DngConverter {
                folder: String::new(),
                overwrite: false,
                log: LogBuffer::new(),
                running: false,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::FolderChanged(folder) => {
                self.folder = folder;
                Task::none()
            }
            Message::BrowseFolder => {
                if let Some(folder) = dialogs::select_folder() {
                    self.folder = folder.display().to_string();
                }
                Task::none()
            }
            Message::OverwriteToggled(overwrite) => {
                self.overwrite = overwrite;
                Task::none()
            }
            Message::Convert => self.start_conversion(),
            Message::Progress(event) => {
                self.log.extend(event.log_lines());
                snap_log_to_end()
            }
            Message::Finished(Ok(summary)) => {
                self.running = false;
                for record in summary.failures() {
                    tracing::warn!("not converted: {} -> {}", record.filename, record.output_name);
                }
                self.log.extend(summary.log_lines());
                show_log_then(Notice::new(Level::Info, "Done", summary.dialog_text()))
            }
            Message::Finished(Err(reason)) => {
                self.running = false;
                self.log.push(format!("Conversion aborted: {}", reason));
                show_log_then(Notice::new(Level::Error, "Conversion aborted", reason))
            }
            Message::Notify(notice) => {
                notice.show();
                Task::none()
            }
        }
    }

    fn start_conversion(&mut self) -> Task<Message> {
        if self.running {
            return Task::none();
        }

        let folder = match scan::validate_folder(&self.folder) {
            Ok(folder) => folder,
            Err(problem @ FolderProblem::NoFolder) => {
                dialogs::warning("No folder", &problem.to_string());
                return Task::none();
            }
            Err(problem @ FolderProblem::InvalidFolder) => {
                dialogs::error("Invalid folder", &problem.to_string());
                return Task::none();
            }
        };

        self.log.clear();
        self.log.push(format!(
            "Run started: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        self.log.push(format!("Selected folder: {}", folder.display()));
        self.log.push(format!("Overwrite existing JPGs: {}", self.overwrite));
        self.log.push("Scanning for DNG files...");

        let files = match scan::scan_folder(&folder) {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("scan failed: {}", e);
                self.log.push(format!("ERROR scanning folder: {}", e));
                return show_log_then(Notice::new(Level::Error, "Invalid folder", e.to_string()));
            }
        };

        if files.is_empty() {
            self.log.push("No DNG files found in this folder.");
            return show_log_then(Notice::new(
                Level::Info,
                "No files",
                "No DNG files found in the selected folder.",
            ));
        }

        self.running = true;
        let job = ConversionJob { folder, overwrite: self.overwrite };

        Task::batch([snap_log_to_end(), Task::stream(conversion_stream(job, files))])
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let folder_row = row![
            text_input("Folder containing DNG files", &self.folder)
                .on_input(Message::FolderChanged)
                .padding(6),
            button("Browse...").on_press(Message::BrowseFolder).padding(6),
        ]
        .spacing(5);

        let convert_button = button("Convert DNG → JPG")
            .padding([5, 10])
            .on_press_maybe((!self.running).then_some(Message::Convert));

        let lines: Column<Message> = self
            .log
            .lines()
            .iter()
            .fold(Column::new().spacing(2), |col, line| {
                let line_text = text(line.as_str()).font(Font::MONOSPACE).size(13);
                col.push(if is_error_line(line) {
                    line_text.color(Color::from_rgb(0.9, 0.3, 0.3))
                } else {
                    line_text
                })
            });

        let log_pane = container(
            scrollable(lines)
                .id(log_scroll_id())
                .width(Length::Fill)
                .height(Length::Fill),
        )
        .padding(5)
        .style(container::bordered_box)
        .width(Length::Fill)
        .height(Length::Fill);

        let content = column![
            text("Selected folder:"),
            folder_row,
            checkbox("Overwrite existing JPG files", self.overwrite)
                .on_toggle(Message::OverwriteToggled),
            container(convert_button).center_x(Length::Fill),
            text("Log:"),
            log_pane,
        ]
        .spacing(8)
        .padding(10);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn log_scroll_id() -> scrollable::Id {
    scrollable::Id::new("log")
}

/// Keep the newest log line visible
fn snap_log_to_end() -> Task<Message> {
    scrollable::snap_to(log_scroll_id(), scrollable::RelativeOffset::END)
}

/// Scroll the log to its end, then raise the dialog on a later update
/// so the new lines are already drawn behind it
fn show_log_then(notice: Notice) -> Task<Message> {
    snap_log_to_end().chain(Task::done(Message::Notify(notice)))
}

/// Run the conversion on a blocking worker and stream its events back
/// to the UI as messages
fn conversion_stream(job: ConversionJob, files: Vec<PathBuf>) -> impl Stream<Item = Message> {
    iced::stream::channel(100, move |mut output: mpsc::Sender<Message>| async move {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let worker = tokio::task::spawn_blocking(move || {
            convert::run_job(&job, &files, &RawloaderDecoder, |event| {
                // The receiver only goes away if the UI is shutting down
                let _ = tx.send(event);
            })
        });

        while let Some(event) = rx.recv().await {
            let _ = output.send(Message::Progress(event)).await;
        }

        let finished = worker.await.map_err(|e| {
            tracing::error!("conversion worker failed: {}", e);
            format!("conversion worker failed: {}", e)
        });
        let _ = output.send(Message::Finished(finished)).await;
    })
}

fn main() -> ExitCode {
    logging::init();

    let result = iced::application("DNG to JPG Converter", DngConverter::update, DngConverter::view)
        .theme(DngConverter::theme)
        .window(window::Settings {
            size: Size::new(640.0, 480.0),
            min_size: Some(Size::new(500.0, 400.0)),
            ..Default::default()
        })
        .centered()
        .run_with(DngConverter::new);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("failed to start the user interface: {}", e);
            eprintln!("Failed to start the user interface: {}", e);
            ExitCode::from(1)
        }
    }
}
