//! Line-oriented file logger writing the session directory layout.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use obx_core::{ErrorInfo, ObxError, ProblemMeta};

use crate::attributes::AttributeCell;
use crate::layout;
use crate::triggers::{TriggerPlan, TriggerSet};
use crate::{Logger, Measurement};

/// Parameters for opening a [`FileLogger`] session.
#[derive(Debug, Clone)]
pub struct SessionSpec {
    /// Root directory under which the session folder is created.
    pub output_directory: PathBuf,
    /// Requested folder name; the session falls back to suffixed variants
    /// when the name is already taken.
    pub folder_name: String,
    /// Algorithm name recorded in summary headers.
    pub algorithm_name: String,
    /// Free-form algorithm description recorded in summary headers.
    pub algorithm_info: String,
    /// Whether data rows include the evaluated positions.
    pub store_positions: bool,
    /// Trigger configuration deciding which measurements are recorded.
    pub triggers: TriggerPlan,
}

impl Default for SessionSpec {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            folder_name: "obx_data".to_string(),
            algorithm_name: "algorithm".to_string(),
            algorithm_info: String::new(),
            store_positions: false,
            triggers: TriggerPlan::default(),
        }
    }
}

struct RunProgress {
    evaluations: u64,
    best_y: f64,
    header_written: bool,
}

impl RunProgress {
    fn new() -> Self {
        Self {
            evaluations: 0,
            best_y: f64::NAN,
            header_written: false,
        }
    }
}

struct Attached {
    meta: ProblemMeta,
    triggers: TriggerSet,
    info_path: PathBuf,
    data_path: PathBuf,
    /// `data_f<fid>_<name>/obx_f<fid>_DIM<dim>.dat`, as referenced from the
    /// summary file.
    data_relative: String,
    data: BufWriter<File>,
    run: RunProgress,
}

/// Logger session writing one summary file and one paired data directory per
/// attached problem family into a uniquely-owned session directory.
pub struct FileLogger {
    directory: PathBuf,
    algorithm_name: String,
    algorithm_info: String,
    store_positions: bool,
    trigger_plan: TriggerPlan,
    experiment_attributes: BTreeMap<String, f64>,
    run_attributes: Vec<(String, AttributeCell)>,
    logged_attributes: Vec<(String, AttributeCell)>,
    attached: Option<Attached>,
}

impl FileLogger {
    /// Opens a new session, claiming a directory no other session owns.
    pub fn create(spec: &SessionSpec) -> Result<Self, ObxError> {
        let directory = layout::unique_directory(&spec.output_directory, &spec.folder_name)?;
        Ok(Self {
            directory,
            algorithm_name: spec.algorithm_name.clone(),
            algorithm_info: spec.algorithm_info.clone(),
            store_positions: spec.store_positions,
            trigger_plan: spec.triggers.clone(),
            experiment_attributes: BTreeMap::new(),
            run_attributes: Vec::new(),
            logged_attributes: Vec::new(),
            attached: None,
        })
    }

    /// The directory this session writes into.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn finalize_run(&mut self) -> Result<(), ObxError> {
        let Some(attached) = self.attached.as_mut() else {
            return Ok(());
        };
        if attached.run.evaluations == 0 {
            return Ok(());
        }
        let mut line = format!(
            "{}, {}:{}",
            attached.data_relative, attached.run.evaluations, attached.run.best_y
        );
        for (name, cell) in &self.run_attributes {
            line.push_str(&format!(", {name} = {}", cell.get()));
        }
        append_line(&attached.info_path, &line)?;
        attached
            .data
            .flush()
            .map_err(|err| ObxError::io("data_flush", attached.data_path.display(), err))?;
        attached.run = RunProgress::new();
        attached.triggers.reset();
        Ok(())
    }
}

impl Logger for FileLogger {
    fn declare_experiment_attributes(&mut self, attributes: &BTreeMap<String, f64>) {
        self.experiment_attributes = attributes.clone();
    }

    fn declare_run_attributes(&mut self, attributes: &[(String, AttributeCell)]) {
        self.run_attributes = attributes.to_vec();
    }

    fn declare_logged_attributes(&mut self, attributes: &[(String, AttributeCell)]) {
        self.logged_attributes = attributes.to_vec();
    }

    fn attach(&mut self, meta: &ProblemMeta) -> Result<(), ObxError> {
        self.finalize_run()?;
        let summary = layout::summary_file_name(meta.fid, &meta.name);
        let data_dir_name = layout::data_directory_name(&summary).ok_or_else(|| {
            ObxError::MergeFormat(
                ErrorInfo::new("summary_name", "summary file name has no paired data directory")
                    .with_context("file", summary.clone()),
            )
        })?;
        let info_path = self.directory.join(&summary);
        let data_dir = self.directory.join(&data_dir_name);
        std::fs::create_dir_all(&data_dir)
            .map_err(|err| ObxError::io("data_dir", data_dir.display(), err))?;
        let data_file = layout::data_file_name(meta.fid, meta.dim);
        let data_path = data_dir.join(&data_file);
        let data = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&data_path)
            .map_err(|err| ObxError::io("data_open", data_path.display(), err))?;

        if !info_path.exists() {
            let mut header = format!(
                "suite = {}, function = {}, name = {}, dim = {}, algorithm = {}",
                meta.suite.as_str(),
                meta.fid,
                meta.name,
                meta.dim,
                self.algorithm_name
            );
            for (name, value) in &self.experiment_attributes {
                header.push_str(&format!(", {name} = {value}"));
            }
            append_line(&info_path, &header)?;
            append_line(&info_path, &format!("% {}", self.algorithm_info))?;
        }

        self.attached = Some(Attached {
            triggers: TriggerSet::new(self.trigger_plan.clone(), meta.direction),
            meta: meta.clone(),
            info_path,
            data_path,
            data_relative: format!("{data_dir_name}/{data_file}"),
            data: BufWriter::new(data),
            run: RunProgress::new(),
        });
        Ok(())
    }

    fn log(&mut self, measurement: &Measurement<'_>) -> Result<(), ObxError> {
        let store_positions = self.store_positions;
        let logged_attributes = &self.logged_attributes;
        let attached = self.attached.as_mut().ok_or_else(|| {
            ObxError::Config(ErrorInfo::new(
                "session_not_attached",
                "logger session has no attached problem",
            ))
        })?;
        attached.run.evaluations = measurement.evaluations;
        attached.run.best_y = measurement.best_y;
        if !attached
            .triggers
            .should_log(measurement.evaluations, measurement.raw_y)
        {
            return Ok(());
        }
        if !attached.run.header_written {
            let mut header = String::from("% evaluations raw_y best_y");
            for (name, _) in logged_attributes {
                header.push(' ');
                header.push_str(name);
            }
            if store_positions {
                for index in 0..attached.meta.dim {
                    header.push_str(&format!(" x{index}"));
                }
            }
            writeln!(attached.data, "{header}")
                .map_err(|err| ObxError::io("data_write", attached.data_path.display(), err))?;
            attached.run.header_written = true;
        }
        let mut row = format!(
            "{} {} {}",
            measurement.evaluations, measurement.raw_y, measurement.best_y
        );
        for (_, cell) in logged_attributes {
            row.push_str(&format!(" {}", cell.get()));
        }
        if store_positions {
            for value in measurement.x {
                row.push_str(&format!(" {value}"));
            }
        }
        writeln!(attached.data, "{row}")
            .map_err(|err| ObxError::io("data_write", attached.data_path.display(), err))?;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), ObxError> {
        self.finalize_run()
    }

    fn close(&mut self) -> Result<(), ObxError> {
        self.finalize_run()?;
        if let Some(attached) = self.attached.as_mut() {
            attached
                .data
                .flush()
                .map_err(|err| ObxError::io("data_flush", attached.data_path.display(), err))?;
        }
        Ok(())
    }
}

fn append_line(path: &Path, line: &str) -> Result<(), ObxError> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|err| ObxError::io("summary_open", path.display(), err))?;
    writeln!(file, "{line}").map_err(|err| ObxError::io("summary_write", path.display(), err))
}
