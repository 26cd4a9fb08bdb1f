//! Output writer: materialize task artifacts under the task namespace

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use experiment_core::{Error, FigureConfig, Result, TaskId};
use serde::Serialize;
use serde_json::Value;
use storage::{write_atomic, write_json_atomic, OutputLayout};
use tracing::info;

use crate::figure::Figure;
use crate::summary::Summary;

/// Artifacts to save for one task, each independently optional
#[derive(Default)]
pub struct OutputBundle<'a> {
    figures: Vec<(String, &'a dyn Figure)>,
    metrics: Option<BTreeMap<String, Value>>,
    summary: Option<Summary>,
    subfolder: Option<String>,
}

impl<'a> OutputBundle<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one named figure; the name gains a `.png` extension if missing
    pub fn figure<S: Into<String>>(mut self, name: S, figure: &'a dyn Figure) -> Self {
        self.figures.push((name.into(), figure));
        self
    }

    /// Add figures from a name-to-figure mapping or an ordered list
    pub fn figures<I>(mut self, figures: I) -> Self
    where
        I: IntoIterator<Item = (String, &'a dyn Figure)>,
    {
        self.figures.extend(figures);
        self
    }

    /// Set the metrics snapshot, replacing `metrics.json` wholesale
    pub fn metrics(mut self, metrics: BTreeMap<String, Value>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Set the summary document
    pub fn summary<S: Into<Summary>>(mut self, summary: S) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Nest this call's figures under `figures/<subfolder>/`
    pub fn subfolder<S: Into<String>>(mut self, subfolder: S) -> Self {
        self.subfolder = Some(subfolder.into());
        self
    }
}

/// Writes output bundles under task namespaces
#[derive(Debug, Clone)]
pub struct OutputWriter {
    layout: OutputLayout,
    figure_config: FigureConfig,
}

impl OutputWriter {
    /// Create a writer over `layout` rendering figures per `figure_config`
    pub fn new(layout: OutputLayout, figure_config: FigureConfig) -> Self {
        Self {
            layout,
            figure_config,
        }
    }

    /// Save the bundle's artifacts for `task_id`
    ///
    /// Returns a mapping from logical artifact name (`figure_<filename>`,
    /// `metrics`, `summary`) to the absolute path written.
    pub fn save(
        &self,
        task_id: TaskId,
        bundle: &OutputBundle<'_>,
    ) -> Result<BTreeMap<String, PathBuf>> {
        let ns = self.layout.task(task_id)?;
        let mut saved = BTreeMap::new();

        if !bundle.figures.is_empty() {
            let mut fig_dir = ns.figures_dir().to_path_buf();
            if let Some(subfolder) = &bundle.subfolder {
                fig_dir = fig_dir.join(subfolder);
                fs::create_dir_all(&fig_dir).map_err(|e| Error::Storage {
                    message: format!("Failed to create directory {:?}: {}", fig_dir, e),
                })?;
            }

            for (name, figure) in &bundle.figures {
                let mut filename = name.clone();
                if !filename.ends_with(".png") {
                    filename.push_str(".png");
                }
                let png = figure
                    .render_png(self.figure_config.width, self.figure_config.height)?;
                let path = fig_dir.join(&filename);
                write_atomic(&path, &png)?;
                saved.insert(format!("figure_{}", filename), absolute(path));
            }
        }

        if let Some(metrics) = &bundle.metrics {
            let path = ns.metrics_path();
            write_json_atomic(&path, metrics)?;
            saved.insert("metrics".to_string(), absolute(path));
        }

        if let Some(summary) = &bundle.summary {
            let path = ns.summary_path();
            write_atomic(&path, summary.render(task_id).as_bytes())?;
            saved.insert("summary".to_string(), absolute(path));
        }

        info!(task_id, artifacts = saved.len(), "Task outputs saved");

        Ok(saved)
    }

    /// Write the run config manifest to `<root>/config.json`
    pub fn save_config<T: Serialize>(&self, config: &T) -> Result<PathBuf> {
        let path = self.layout.config_path();
        let manifest = ConfigManifest {
            created_at: Utc::now(),
            config,
        };
        write_json_atomic(&path, &manifest)?;
        Ok(absolute(path))
    }
}

#[derive(Serialize)]
struct ConfigManifest<'a, T: Serialize> {
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    config: &'a T,
}

fn absolute(path: PathBuf) -> PathBuf {
    fs::canonicalize(&path).unwrap_or(path)
}
