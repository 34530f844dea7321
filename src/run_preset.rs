#![allow(non_snake_case)]

//! Solve a saved system description (JSON or TOML) or a built-in preset and
//! write the time grid and every expectation value to
//! `output/<name>/data.npz`.
//!
//! ```text
//! run_preset <file.json|file.toml|preset name>
//! ```

use std::path::PathBuf;
use anyhow::{ Context, bail };
use ndarray as nd;
use tracing::info;
use tracing_subscriber::EnvFilter;
use atomsys::{
    mkdir,
    write_npz,
    AtomSystem,
    SolveOptions,
    SystemDescription,
    presets,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let Some(source) = std::env::args().nth(1) else {
        bail!(
            "usage: run_preset <file.json|file.toml|preset>; presets: {}",
            presets::NAMES.join(", "),
        );
    };
    let path = PathBuf::from(&source);
    let (name, desc)
        = if path.is_file() {
            let stem = path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("system")
                .to_string();
            let desc = SystemDescription::load(&path)
                .with_context(|| format!("loading {}", path.display()))?;
            (stem, desc)
        } else if let Some(desc) = presets::by_name(&source) {
            (source.clone(), desc)
        } else {
            bail!("'{}' is neither a file nor a preset", source);
        };

    let mut system = AtomSystem::from_description(desc)?;
    let solution = system.solve(SolveOptions::default())?;

    let outdir = PathBuf::from("output").join(&name);
    mkdir!(outdir);
    let labels: Vec<String> = solution.e_ops.keys().cloned().collect();
    let expect: nd::Array2<f64>
        = nd::stack(
            nd::Axis(0),
            &solution.expect_all().values().map(|x| x.view()).collect::<Vec<_>>(),
        )?;
    let rho_final: nd::Array2<atomsys::utils::C64>
        = solution.trajectory.final_state().cloned()
        .unwrap_or_else(|| system.initial_state().clone());
    write_npz!(
        outdir.join("data.npz"),
        arrays: {
            "time" => solution.times(),
            "expect" => &expect,
            "rho_final" => &rho_final,
        }
    );
    std::fs::write(outdir.join("labels.txt"), labels.join("\n"))?;
    info!(dir = %outdir.display(), n_ops = labels.len(), "wrote results");
    Ok(())
}
