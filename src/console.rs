use std::cell::RefCell;

use indicatif::ProgressBar;

use crate::{
    data::ImageRef,
    progress::ProgressConfig,
    screen::{Notice, ScreenView},
};

/// Terminal view: notices go to stderr, loading is a spinner
pub struct ConsoleView {
    progress: ProgressConfig,
    spinner: RefCell<Option<ProgressBar>>,
}

impl ConsoleView {
    pub fn new(progress: ProgressConfig) -> Self {
        Self {
            progress,
            spinner: RefCell::new(None),
        }
    }

    fn stop_spinner(&self) {
        if let Some(pb) = self.spinner.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }
}

impl ScreenView for ConsoleView {
    fn notify(&self, notice: &Notice) {
        let spinner = self.spinner.borrow();
        match spinner.as_ref() {
            Some(pb) => pb.suspend(|| eprintln!("{}", notice)),
            None => eprintln!("{}", notice),
        }
    }

    fn set_loading(&self, loading: bool) {
        if !loading {
            self.stop_spinner();
            return;
        }
        match self.progress.build_spinner("Recoloring...") {
            Ok(pb) => {
                self.stop_spinner();
                *self.spinner.borrow_mut() = Some(pb);
            }
            Err(err) => log::warn!("failed to build spinner: {}", err),
        }
    }

    fn show_image(&self, image: Option<&ImageRef>) {
        match image {
            Some(image) => log::info!("showing {:?}", image),
            None => log::info!("showing nothing"),
        }
    }
}
