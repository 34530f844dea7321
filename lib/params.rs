//! System-wide parameters: magnetic field, structural switches, and the time
//! grid.

use std::f64::consts::TAU;
use ndarray as nd;
use serde::{ Deserialize, Serialize };
use crate::{
    error::{ Error, Result },
    polarization::Vec3,
};

fn default_bdir() -> Vec3 { [0.0, 0.0, 1.0] }

fn default_true() -> bool { true }

fn default_t_max() -> f64 { 5.0 }

fn default_n_step() -> usize { 100 }

fn default_freq_scaling() -> f64 { TAU * 21e6 }

/// Parameters shared by every component of an atomic system.
///
/// Field names follow the declarative description format. All frequencies in
/// the system are in units of `freq_scaling` (an angular frequency in rad/s).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemParams {
    /// Magnetic field magnitude [G]
    #[serde(default)]
    pub B: f64,

    /// Magnetic field direction (quantization axis)
    #[serde(default = "default_bdir")]
    pub Bdir: Vec3,

    /// Resolve magnetic sublevels; without this every level is a single state
    #[serde(default)]
    pub zeeman: bool,

    /// Incoherent (`true`) or coherent (`false`) initial superposition
    #[serde(default = "default_true")]
    pub mixed: bool,

    #[serde(default)]
    pub t_start: f64,

    #[serde(default = "default_t_max")]
    pub t_max: f64,

    /// Number of points in the output time grid, endpoints included
    #[serde(default = "default_n_step")]
    pub n_step: usize,

    /// Unit of frequency [rad/s]
    #[serde(default = "default_freq_scaling")]
    pub freq_scaling: f64,
}

impl Default for SystemParams {
    fn default() -> Self {
        Self {
            B: 0.0,
            Bdir: default_bdir(),
            zeeman: false,
            mixed: true,
            t_start: 0.0,
            t_max: default_t_max(),
            n_step: default_n_step(),
            freq_scaling: default_freq_scaling(),
        }
    }
}

impl SystemParams {
    /// Check that the time grid is usable and all scalars are finite.
    pub fn validate(&self) -> Result<()> {
        let finite
            = [self.B, self.t_start, self.t_max, self.freq_scaling]
            .into_iter()
            .chain(self.Bdir)
            .all(f64::is_finite);
        if !finite {
            return Err(Error::InvalidParams("all parameters must be finite".into()));
        }
        if self.n_step < 2 {
            return Err(Error::InvalidParams(
                format!("n_step must be at least 2, got {}", self.n_step)));
        }
        if self.t_max <= self.t_start {
            return Err(Error::InvalidParams(
                format!("t_max ({}) must exceed t_start ({})", self.t_max, self.t_start)));
        }
        if self.freq_scaling <= 0.0 {
            return Err(Error::InvalidParams("freq_scaling must be positive".into()));
        }
        Ok(())
    }

    /// Uniform time grid from `t_start` to `t_max` with `n_step` points.
    pub fn time_grid(&self) -> nd::Array1<f64> {
        nd::Array1::linspace(self.t_start, self.t_max, self.n_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let params: SystemParams = serde_json::from_str(r#"{"B": 3.0, "zeeman": true}"#).unwrap();
        assert_eq!(params.B, 3.0);
        assert!(params.zeeman);
        assert!(params.mixed);
        assert_eq!(params.Bdir, [0.0, 0.0, 1.0]);
        assert_eq!(params.n_step, 100);
        assert!(params.validate().is_ok());

        let from_toml: SystemParams = toml::from_str("B = 3.0\nzeeman = true\n").unwrap();
        assert_eq!(from_toml, params);
    }

    #[test]
    fn time_grid_bounds() {
        let params = SystemParams { t_start: 1.0, t_max: 3.0, n_step: 5, ..Default::default() };
        let t = params.time_grid();
        assert_eq!(t.len(), 5);
        assert_eq!(t[0], 1.0);
        assert_eq!(t[4], 3.0);
        assert_eq!(t[1], 1.5);
    }

    #[test]
    fn invalid_grids_rejected() {
        let short = SystemParams { n_step: 1, ..Default::default() };
        assert!(matches!(short.validate(), Err(Error::InvalidParams(_))));
        let backwards = SystemParams { t_max: -1.0, ..Default::default() };
        assert!(backwards.validate().is_err());
        let nan = SystemParams { B: f64::NAN, ..Default::default() };
        assert!(nan.validate().is_err());
    }
}
