use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::PlotConfig;
use crate::error::PlotError;
use crate::perf::Series;
use crate::plot::{self, Figure};

/// Something that can put an exported figure on screen.
pub trait Viewer {
    fn show(&self, path: &Path) -> Result<(), PlotError>;
}

/// Never shows anything.
pub struct NoViewer;

impl Viewer for NoViewer {
    fn show(&self, _path: &Path) -> Result<(), PlotError> {
        Err(PlotError::DisplayUnavailable("display disabled".to_string()))
    }
}

/// Hands the file to the desktop's default image viewer without waiting for it.
pub struct SystemViewer;

impl SystemViewer {
    fn opener(path: &Path) -> Result<Command, PlotError> {
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(path);
            Ok(cmd)
        } else if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(path);
            Ok(cmd)
        } else {
            let has_display = ["DISPLAY", "WAYLAND_DISPLAY"]
                .iter()
                .any(|var| std::env::var_os(var).is_some_and(|v| !v.is_empty()));
            if !has_display {
                return Err(PlotError::DisplayUnavailable(
                    "neither DISPLAY nor WAYLAND_DISPLAY is set".to_string(),
                ));
            }
            let mut cmd = Command::new("xdg-open");
            cmd.arg(path);
            Ok(cmd)
        }
    }
}

impl Viewer for SystemViewer {
    fn show(&self, path: &Path) -> Result<(), PlotError> {
        let mut cmd = Self::opener(path)?;
        let program = cmd.get_program().to_os_string();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_child| ())
            .map_err(|e| PlotError::DisplayUnavailable(format!("{:?}: {}", program, e)))
    }
}

/// Export the figure, then try to show it.
///
/// The file is always written first. A viewer failure only gets logged.
pub fn present(
    series: &Series,
    config: &PlotConfig,
    viewer: &dyn Viewer,
) -> Result<Figure, PlotError> {
    let figure = plot::write_plot(series, config)?;

    match viewer.show(&config.output) {
        Ok(()) => tracing::debug!("opened {}", config.output.display()),
        Err(PlotError::DisplayUnavailable(reason)) => {
            tracing::debug!("not showing {}: {}", config.output.display(), reason)
        }
        Err(e) => tracing::warn!("could not show {}: {}", config.output.display(), e),
    }

    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perf_data::recorded_series;
    use std::cell::RefCell;
    use std::path::PathBuf;

    #[derive(Default)]
    struct RecordingViewer {
        shown: RefCell<Vec<(PathBuf, bool)>>,
    }

    impl Viewer for RecordingViewer {
        fn show(&self, path: &Path) -> Result<(), PlotError> {
            self.shown.borrow_mut().push((path.to_path_buf(), path.exists()));
            Ok(())
        }
    }

    struct BrokenViewer;

    impl Viewer for BrokenViewer {
        fn show(&self, _path: &Path) -> Result<(), PlotError> {
            Err(PlotError::Render("viewer crashed".to_string()))
        }
    }

    #[test]
    fn file_exists_before_viewer_runs() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlotConfig::default().with_output(dir.path().join("speedup.png"));
        let viewer = RecordingViewer::default();

        present(&recorded_series(), &config, &viewer).unwrap();

        assert_eq!(*viewer.shown.borrow(), vec![(config.output.clone(), true)]);
    }

    #[test]
    fn missing_display_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlotConfig::default().with_output(dir.path().join("speedup.png"));

        let figure = present(&recorded_series(), &config, &NoViewer).unwrap();

        assert_eq!(figure.point_count(), 8);
        assert!(config.output.exists());
    }

    #[test]
    fn viewer_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlotConfig::default().with_output(dir.path().join("speedup.png"));

        assert!(present(&recorded_series(), &config, &BrokenViewer).is_ok());
        assert!(config.output.exists());
    }

    #[test]
    fn export_failure_skips_the_viewer() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlotConfig::default().with_output(dir.path().join("nope").join("speedup.png"));
        let viewer = RecordingViewer::default();

        let err = present(&recorded_series(), &config, &viewer).unwrap_err();

        assert!(matches!(err, PlotError::Io { .. }));
        assert!(viewer.shown.borrow().is_empty());
    }
}
