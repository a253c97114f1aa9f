use std::time::Duration;

use eframe::{egui, glow};

use crate::state::State;
use crate::{ui, ScanTool, INITIAL_HEIGHT, INITIAL_WIDTH};

// Implementations specific to App lifecycle and top-level control
impl ScanTool {
    // Initialization logic called once at the start
    fn init(&mut self) {
        if self.preview {
            log::info!("Preview mode: camera disabled, no source started.");
        } else if !self.spawn_worker() {
            log::warn!("No source running; start one from the scan screen.");
        }

        self.state = State::Running;
        log::info!("Initialization complete. State set to Running.");
    }

    pub(crate) fn handle_start_stop_toggle(&mut self) {
        if self.preview {
            log::warn!("Start/Stop ignored in preview mode.");
            return;
        }
        if self.get_thread_status() {
            self.stop_worker();
        } else if self.spawn_worker() {
            // A restarted source begins a fresh scan session
            self.session.reset();
            self.frame_texture = None;
            log::info!("Scan worker started.");
        }
    }

    // Graceful shutdown logic
    fn shutdown_app(&mut self) {
        log::info!("Shutdown requested.");
        self.stop_worker();

        if let Err(e) = self.config.save() {
            log::error!("Failed to save configuration on exit: {}", e);
        } else {
            log::info!("Configuration saved.");
        }
        log::info!("Shutdown complete.");
    }
}

// Main eframe application loop
impl eframe::App for ScanTool {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Keep polling the channel even when the user is idle
        ctx.request_repaint_after(Duration::from_millis(50));
        self.drain_events();

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| match self.state {
                State::Initialising => {
                    ui.centered_and_justified(|ui| {
                        ui.label("Initialising...");
                    });
                    self.init();
                }
                State::About => {
                    ui::draw_about_screen(self, ui);
                }
                State::Running => {
                    ui::draw_scan_screen(self, ui, ctx);
                }
            });
    }

    // Called when the application is about to close
    fn on_exit(&mut self, _gl: Option<&glow::Context>) {
        self.shutdown_app();
    }
}

pub fn native_options() -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([INITIAL_WIDTH, INITIAL_HEIGHT])
            .with_title(crate::PROGRAM_TITLE),
        ..Default::default()
    }
}
