//! The top-level analysis driver: orchestrates model checks, pre-processing,
//! the static/frequency/buckling solution procedures, and output.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;

use crate::error::Result;
use crate::model::Mdb;
use crate::types::{Real, RealMatrix, RealVector};

use super::odb::{Odb, OdbMode};
use super::procedures as pro;
use super::validation::{check_mdb, AnalysisKind};
use super::linalg;

/// The kind of finite element analysis to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analysis {
    Static,
    Frequency,
    Buckling,
}

impl Analysis {
    fn title(self) -> &'static str {
        match self {
            Analysis::Static => "STATIC ANALYSIS",
            Analysis::Frequency => "FREQUENCY ANALYSIS",
            Analysis::Buckling => "BUCKLING ANALYSIS",
        }
    }

    fn kind(self) -> AnalysisKind {
        match self {
            Analysis::Static => AnalysisKind::Static,
            Analysis::Frequency => AnalysisKind::Frequency,
            Analysis::Buckling => AnalysisKind::Buckling,
        }
    }
}

/// Run-time options for [`solve`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Number of eigenvalues/eigenvectors to extract for a frequency or
    /// buckling analysis; ignored for a static analysis.
    pub num_modes: usize,
    /// Base name for the `.log` and `.out` files; defaults to the running
    /// binary's own name.
    pub job_name: Option<String>,
    /// Number of worker threads to fan out element-level work across.
    pub processes: usize,
    pub print_log: bool,
    pub write_log: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            num_modes: 10,
            job_name: None,
            processes: 1,
            print_log: true,
            write_log: true,
        }
    }
}

fn center(text: &str, width: usize) -> String {
    if text.len() >= width {
        return text.to_string();
    }
    let total_pad = width - text.len();
    let left = total_pad / 2;
    let right = total_pad - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

struct RunLog {
    print_log: bool,
    write_log: bool,
    log_path: PathBuf,
    started: bool,
}

impl RunLog {
    fn new(log_path: PathBuf, print_log: bool, write_log: bool) -> Self {
        Self {
            print_log,
            write_log,
            log_path,
            started: false,
        }
    }

    fn log(&mut self, message: &str) -> Result<()> {
        if self.print_log {
            println!("{message}");
        }
        if self.write_log {
            if !self.started {
                fs::write(&self.log_path, format!("{message}\n"))?;
                self.started = true;
            } else {
                use std::io::Write;
                let mut file = fs::OpenOptions::new().append(true).create(true).open(&self.log_path)?;
                writeln!(file, "{message}")?;
            }
        }
        Ok(())
    }

    fn blank(&mut self) -> Result<()> {
        self.log("")
    }
}

fn column(matrix: &RealMatrix, col: usize) -> Vec<Real> {
    matrix.column(col).iter().copied().collect()
}

/// Performs the specified finite element analysis: checks the model
/// database, builds the DOF enumeration and element properties, runs the
/// requested analysis procedure, and writes a `.log` and `.out` file named
/// after `options.job_name` (or the running binary).
pub fn solve(mdb: &mut Mdb, analysis: Analysis, options: RunOptions) -> Result<()> {
    let job_name = options.job_name.clone().unwrap_or_else(|| {
        std::env::args()
            .next()
            .map(|p| {
                PathBuf::from(p)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "feapack".to_string())
            })
            .unwrap_or_else(|| "feapack".to_string())
    });
    let log_path = PathBuf::from(format!("{job_name}.log"));
    let out_path = PathBuf::from(format!("{job_name}.out"));

    let mut log = RunLog::new(log_path, options.print_log, options.write_log);
    let start = Instant::now();

    let result = run_inner(mdb, analysis, &options, &out_path, &mut log);

    let elapsed = start.elapsed().as_secs_f64();
    log.log(&format!("Elapsed time is {:.3} seconds", (elapsed * 1000.0).round() / 1000.0))?;
    log.log("--- END OF RUN ---")?;

    result
}

fn run_inner(
    mdb: &mut Mdb,
    analysis: Analysis,
    options: &RunOptions,
    out_path: &PathBuf,
    log: &mut RunLog,
) -> Result<()> {
    let now = Local::now();
    log.log("+-------------------------------------+")?;
    log.log("|                                     |")?;
    log.log("|   F E A P A C K   -   S O L V E R   |")?;
    log.log("|  ---------------------------------  |")?;
    log.log(&format!("|{}|", center(&format!("VERSION {}", env!("CARGO_PKG_VERSION")), 37)))?;
    log.log("|                                     |")?;
    log.log(&format!(
        "|   DATE {}   TIME {}   |",
        now.format("%Y-%m-%d"),
        now.format("%H:%M:%S")
    ))?;
    log.log("|                                     |")?;
    log.log("|                                     |")?;
    log.log(&format!("|{}|", center("--- START OF RUN ---", 37)))?;
    log.log("|                                     |")?;
    log.log("+-------------------------------------+")?;
    log.blank()?;

    log.log("GENERAL INFO")?;
    log.log("------------")?;
    let analysis_name = match analysis {
        Analysis::Static => "static",
        Analysis::Frequency => "frequency",
        Analysis::Buckling => "buckling",
    };
    log.log(&format!("* Analysis    {analysis_name}"))?;
    log.log(&format!(
        "* Mode        {}",
        if options.processes > 1 { "parallel" } else { "sequential" }
    ))?;
    log.log(&format!("* Processes   {}", options.processes.max(1)))?;
    log.blank()?;

    log.log("MODEL DATABASE CHECKS")?;
    log.log("---------------------")?;
    let (errors, warnings) = check_mdb(mdb, analysis.kind());
    for warning in &warnings {
        log.log(&format!("[Warning] {warning}"))?;
    }
    for error in &errors {
        log.log(&format!("[Error] {error}"))?;
    }
    if errors.is_empty() && warnings.is_empty() {
        log.log("Basic checks found no warnings nor errors")?;
    } else {
        let mut message = String::from("Basic checks found ");
        if !warnings.is_empty() {
            message += &format!("{} warning(s)", warnings.len());
        }
        if !warnings.is_empty() && !errors.is_empty() {
            message += " and ";
        }
        if !errors.is_empty() {
            message += &format!("{} error(s)", errors.len());
        }
        log.log(&message)?;
    }
    log.blank()?;

    if !errors.is_empty() {
        log.log("Solver has stopped prematurely due to errors (see above)")?;
        return Ok(());
    }

    log.log("PRE-PROCESSING")?;
    log.log("--------------")?;
    mdb.build_dofs()?;
    mdb.assign_element_properties()?;
    log.log(&format!("Number of nodes: {}", mdb.mesh().node_count()))?;
    log.log(&format!("Number of elements: {}", mdb.mesh().element_count()))?;
    log.log(&format!(
        "Number of active degrees of freedom: {}",
        mdb.mesh().active_dof_count()
    ))?;
    log.log(&format!(
        "Number of inactive degrees of freedom: {}",
        mdb.mesh().inactive_dof_count()
    ))?;
    log.blank()?;

    log.log(analysis.title())?;
    log.log(&"-".repeat(analysis.title().len()))?;
    let analysis_result = match analysis {
        Analysis::Static => static_analysis(mdb, options.processes, out_path, log),
        Analysis::Frequency => frequency_analysis(mdb, options.num_modes, options.processes, out_path, log),
        Analysis::Buckling => buckling_analysis(mdb, options.num_modes, options.processes, out_path, log),
    };

    match analysis_result {
        Ok(()) => {
            log.blank()?;
            log.log("Successful run")?;
            Ok(())
        }
        Err(err) => {
            log.blank()?;
            log.log(&format!("{err}"))?;
            log.log("Solver has stopped prematurely due to an exception (see above)")?;
            Err(err)
        }
    }
}

fn static_analysis(mdb: &Mdb, processes: usize, out_path: &PathBuf, log: &mut RunLog) -> Result<()> {
    log.log("Building algebraic system...")?;
    let k = pro::assemble_stiffness_matrix(mdb, processes)?;

    let mut pa = RealVector::zeros(mdb.mesh().active_dof_count());
    pa += pro::assemble_concentrated_load_vector(mdb);
    pa += pro::assemble_surface_load_vector(mdb, processes)?;
    pa += pro::assemble_body_load_vector(mdb, processes)?;

    let ub = pro::assemble_prescribed_displacement_vector(mdb);

    log.log("Solving algebraic system...")?;
    let rhs = pa.clone() - linalg::spmatmul(&k.ab, &ub);
    let ua = linalg::spsolve(&k.aa, &rhs)?;

    log.log("General post-processing...")?;
    let strain_energy = 0.5 * ua.dot(&rhs);
    let pb = linalg::spmatmul(&k.ba, &ua) + linalg::spmatmul(&k.bb, &ub);

    let (fa, _, eps_ips, sigma_ips) = pro::assemble_internal_force_vector(mdb, &ua, &ub, processes)?;
    let residual = (&rhs - &fa).amax();

    let eps_ips = pro::extend_strain(mdb, &eps_ips, processes);
    let sigma_ips = pro::extend_stress(mdb, &sigma_ips, processes);
    let eps_nds = pro::extrapolate(mdb, &eps_ips, processes);
    let sigma_nds = pro::extrapolate(mdb, &sigma_ips, processes);
    let eps_msh = pro::smoothing(mdb, &eps_nds);
    let sigma_msh = pro::smoothing(mdb, &sigma_nds);

    let disp = pro::unshuffle_vector(mdb, Some(&ua), Some(&ub));
    let reac = pro::unshuffle_vector(mdb, None, Some(&pb));
    let forc = pro::unshuffle_vector(mdb, Some(&pa), None);

    log.log("Writing output frame 0 to file...")?;
    let mut odb = Odb::new(out_path, OdbMode::Write, true)?;
    odb.write_next_frame("Increment 0: Time = 0.0", mdb.mesh(), &[], &[])?;

    log.log("Writing output frame 1 to file...")?;
    let node_output = vec![
        ("Displacement>Displacement in X".to_string(), column(&disp, 0)),
        ("Displacement>Displacement in Y".to_string(), column(&disp, 1)),
        ("Displacement>Displacement in Z".to_string(), column(&disp, 2)),
        ("Displacement>Magnitude of Displacement".to_string(), column(&disp, 3)),
        ("Reaction Force>Reaction Force in X".to_string(), column(&reac, 0)),
        ("Reaction Force>Reaction Force in Y".to_string(), column(&reac, 1)),
        ("Reaction Force>Reaction Force in Z".to_string(), column(&reac, 2)),
        ("Reaction Force>Magnitude of Reaction Force".to_string(), column(&reac, 3)),
        ("Nodal Force>Nodal Force in X".to_string(), column(&forc, 0)),
        ("Nodal Force>Nodal Force in Y".to_string(), column(&forc, 1)),
        ("Nodal Force>Nodal Force in Z".to_string(), column(&forc, 2)),
        ("Nodal Force>Magnitude of Nodal Force".to_string(), column(&forc, 3)),
        ("Strain>Component XX of Strain".to_string(), column(&eps_msh, 0)),
        ("Strain>Component YY of Strain".to_string(), column(&eps_msh, 1)),
        ("Strain>Component ZZ of Strain".to_string(), column(&eps_msh, 2)),
        ("Strain>Component YZ of Strain".to_string(), column(&eps_msh, 3)),
        ("Strain>Component ZX of Strain".to_string(), column(&eps_msh, 4)),
        ("Strain>Component XY of Strain".to_string(), column(&eps_msh, 5)),
        ("Strain>Max. Principal Value of Strain".to_string(), column(&eps_msh, 6)),
        ("Strain>Mid. Principal Value of Strain".to_string(), column(&eps_msh, 7)),
        ("Strain>Min. Principal Value of Strain".to_string(), column(&eps_msh, 8)),
        ("Strain>Major Principal Value of Strain".to_string(), column(&eps_msh, 9)),
        ("Stress>Component XX of Stress".to_string(), column(&sigma_msh, 0)),
        ("Stress>Component YY of Stress".to_string(), column(&sigma_msh, 1)),
        ("Stress>Component ZZ of Stress".to_string(), column(&sigma_msh, 2)),
        ("Stress>Component YZ of Stress".to_string(), column(&sigma_msh, 3)),
        ("Stress>Component ZX of Stress".to_string(), column(&sigma_msh, 4)),
        ("Stress>Component XY of Stress".to_string(), column(&sigma_msh, 5)),
        ("Stress>Max. Principal Value of Stress".to_string(), column(&sigma_msh, 6)),
        ("Stress>Mid. Principal Value of Stress".to_string(), column(&sigma_msh, 7)),
        ("Stress>Min. Principal Value of Stress".to_string(), column(&sigma_msh, 8)),
        ("Stress>Major Principal Value of Stress".to_string(), column(&sigma_msh, 9)),
        ("Stress>Equivalent Tresca Stress".to_string(), column(&sigma_msh, 10)),
        ("Stress>Equivalent Mises Stress".to_string(), column(&sigma_msh, 11)),
        ("Stress>Equivalent Pressure Stress".to_string(), column(&sigma_msh, 12)),
    ];
    let global_output = vec![
        ("General>Time".to_string(), 1.0),
        ("General>Residual".to_string(), residual),
        ("General>Strain Energy".to_string(), strain_energy),
    ];
    odb.write_next_frame("Increment 1: Time = 1.0", mdb.mesh(), &node_output, &global_output)?;
    Ok(())
}

fn frequency_analysis(
    mdb: &Mdb,
    num_modes: usize,
    processes: usize,
    out_path: &PathBuf,
    log: &mut RunLog,
) -> Result<()> {
    log.log("Building algebraic system...")?;
    let k = pro::assemble_stiffness_matrix(mdb, processes)?;
    let m = pro::assemble_mass_matrix(mdb, processes)?;

    log.log("Solving eigenproblem...")?;
    let (eigenvalues, mut eigenvectors, residuals) = linalg::speigen(&k.aa, &m.aa, num_modes, "S")?;

    log.log("General post-processing...")?;
    let frequencies: RealVector = eigenvalues.map(|v| v.max(0.0).sqrt() / (2.0 * std::f64::consts::PI));

    for i in 0..eigenvalues.len() {
        let phi = eigenvectors.column(i).into_owned();
        let m_phi = linalg::spmatmul(&m.aa, &phi);
        let norm = phi.dot(&m_phi).sqrt();
        eigenvectors.set_column(i, &(phi / norm));
    }

    let mut odb = Odb::new(out_path, OdbMode::Write, true)?;
    for i in 0..eigenvalues.len() {
        log.log(&format!("Writing output frame {i} to file..."))?;
        let phi = eigenvectors.column(i).into_owned();
        let disp = pro::unshuffle_vector(mdb, Some(&phi), None);
        let description = format!("Mode {}: Frequency = {:+.3E}", i + 1, frequencies[i]);
        let node_output = vec![
            ("Displacement>Displacement in X".to_string(), column(&disp, 0)),
            ("Displacement>Displacement in Y".to_string(), column(&disp, 1)),
            ("Displacement>Displacement in Z".to_string(), column(&disp, 2)),
            ("Displacement>Magnitude of Displacement".to_string(), column(&disp, 3)),
        ];
        let global_output = vec![
            ("General>Eigenvalue".to_string(), eigenvalues[i]),
            ("General>Frequency".to_string(), frequencies[i]),
            ("General>Residual".to_string(), residuals[i]),
        ];
        odb.write_next_frame(&description, mdb.mesh(), &node_output, &global_output)?;
    }
    Ok(())
}

fn buckling_analysis(
    mdb: &Mdb,
    num_modes: usize,
    processes: usize,
    out_path: &PathBuf,
    log: &mut RunLog,
) -> Result<()> {
    log.log("Building algebraic system for static analysis...")?;
    let k = pro::assemble_stiffness_matrix(mdb, processes)?;

    let mut pa = RealVector::zeros(mdb.mesh().active_dof_count());
    pa += pro::assemble_concentrated_load_vector(mdb);
    pa += pro::assemble_surface_load_vector(mdb, processes)?;
    pa += pro::assemble_body_load_vector(mdb, processes)?;
    let ub = pro::assemble_prescribed_displacement_vector(mdb);

    log.log("Solving algebraic system (static analysis)...")?;
    let rhs = pa.clone() - linalg::spmatmul(&k.ab, &ub);
    let ua = linalg::spsolve(&k.aa, &rhs)?;

    log.log("Building algebraic system for buckling analysis...")?;
    let s = pro::assemble_stress_stiffness_matrix(mdb, &ua, &ub, processes)?;

    log.log("Solving eigenproblem...")?;
    let (raw_eigenvalues, mut eigenvectors, residuals) = linalg::speigen(&s.aa, &k.aa, num_modes, "S")?;
    let eigenvalues: RealVector = raw_eigenvalues.map(|mu| -1.0 / mu);

    log.log("General post-processing...")?;
    for i in 0..eigenvalues.len() {
        let phi = eigenvectors.column(i).into_owned();
        let norm = phi.amax();
        eigenvectors.set_column(i, &(phi / norm));
    }

    let mut odb = Odb::new(out_path, OdbMode::Write, true)?;
    for i in 0..eigenvalues.len() {
        log.log(&format!("Writing output frame {i} to file..."))?;
        let phi = eigenvectors.column(i).into_owned();
        let disp = pro::unshuffle_vector(mdb, Some(&phi), None);
        let description = format!("Mode {}: Eigenvalue = {:+.3E}", i + 1, eigenvalues[i]);
        let node_output = vec![
            ("Displacement>Displacement in X".to_string(), column(&disp, 0)),
            ("Displacement>Displacement in Y".to_string(), column(&disp, 1)),
            ("Displacement>Displacement in Z".to_string(), column(&disp, 2)),
            ("Displacement>Magnitude of Displacement".to_string(), column(&disp, 3)),
        ];
        let global_output = vec![
            ("General>Eigenvalue".to_string(), eigenvalues[i]),
            ("General>Residual".to_string(), residuals[i]),
        ];
        odb.write_next_frame(&description, mdb.mesh(), &node_output, &global_output)?;
    }
    Ok(())
}
