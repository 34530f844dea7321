//! Named time envelopes modulating laser couplings.
//!
//! Every envelope function receives the time, the shared argument map, and the
//! namespace of the laser it belongs to. Its own parameters are looked up as
//! `"<namespace>.<param>"` so that several lasers can use the same function
//! with different settings.

use std::{ fmt, rc::Rc };
use indexmap::IndexMap;
use crate::error::{ Error, Result };

/// Shared argument map passed to every envelope during integration.
pub type Args = IndexMap<String, f64>;

/// Signature of an envelope function: `(t, args, namespace) -> amplitude`.
pub type EnvelopeFn = Rc<dyn Fn(f64, &Args, &str) -> f64>;

/// Full key of parameter `param` under `namespace`.
pub fn namespaced(namespace: &str, param: &str) -> String {
    format!("{}.{}", namespace, param)
}

fn arg(args: &Args, namespace: &str, param: &str, default: f64) -> f64 {
    args.get(&namespaced(namespace, param)).copied().unwrap_or(default)
}

/// Gaussian pulse `exp(-((t - mu) / sigma)^2)`, gated to `[t_on, t_off)`.
pub fn gaussian(t: f64, args: &Args, namespace: &str) -> f64 {
    let sigma = arg(args, namespace, "sigma", 0.5);
    let mu = arg(args, namespace, "mu", 2.0);
    let t_on = arg(args, namespace, "t_on", 1.0);
    let t_off = arg(args, namespace, "t_off", 3.0);
    if (t_on..t_off).contains(&t) {
        (-((t - mu) / sigma).powi(2)).exp()
    } else {
        0.0
    }
}

/// Square pulse: 1 on `[t_on, t_off)`, 0 elsewhere.
pub fn switch(t: f64, args: &Args, namespace: &str) -> f64 {
    let t_on = arg(args, namespace, "t_on", 1.0);
    let t_off = arg(args, namespace, "t_off", 3.0);
    if (t_on..t_off).contains(&t) { 1.0 } else { 0.0 }
}

/// An envelope function bound to a namespace.
#[derive(Clone)]
pub struct Envelope {
    func: String,
    namespace: String,
    f: EnvelopeFn,
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("func", &self.func)
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl Envelope {
    /// Name of the underlying registered function.
    pub fn func(&self) -> &str { &self.func }

    /// Namespace under which this envelope's arguments are stored.
    pub fn namespace(&self) -> &str { &self.namespace }

    /// Evaluate the envelope at time `t`.
    pub fn eval(&self, t: f64, args: &Args) -> f64 {
        (self.f)(t, args, &self.namespace)
    }
}

#[derive(Clone)]
struct Registered {
    f: EnvelopeFn,
    defaults: Args,
}

/// Lookup table from envelope names to functions and their default arguments.
///
/// The default registry contains `"gaussian"` and `"switch"`.
#[derive(Clone)]
pub struct EnvelopeRegistry {
    funcs: IndexMap<String, Registered>,
}

impl fmt::Debug for EnvelopeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.funcs.keys()).finish()
    }
}

impl Default for EnvelopeRegistry {
    fn default() -> Self {
        let mut registry = Self { funcs: IndexMap::new() };
        registry.register(
            "gaussian",
            [("sigma", 0.5), ("mu", 2.0), ("t_on", 1.0), ("t_off", 3.0)],
            gaussian,
        );
        registry.register("switch", [("t_on", 1.0), ("t_off", 3.0)], switch);
        registry
    }
}

impl EnvelopeRegistry {
    pub fn new() -> Self { Self::default() }

    /// Register (or replace) an envelope function under `name`, together with
    /// the default values of its (un-namespaced) parameters.
    pub fn register<'a, D, F>(&mut self, name: &str, defaults: D, f: F)
    where
        D: IntoIterator<Item = (&'a str, f64)>,
        F: Fn(f64, &Args, &str) -> f64 + 'static,
    {
        let defaults: Args
            = defaults.into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        self.funcs.insert(name.to_string(), Registered { f: Rc::new(f), defaults });
    }

    /// Bind the function `func` to `namespace` and produce its namespaced
    /// arguments: defaults first, overridden by `given`.
    ///
    /// `by` names the entity requesting the envelope, for error reporting.
    pub fn bind(&self, func: &str, namespace: &str, given: &Args, by: &str)
        -> Result<(Envelope, Args)>
    {
        let reg = self.funcs.get(func)
            .ok_or_else(|| Error::UnknownEnvelope {
                func: func.to_string(),
                by: by.to_string(),
            })?;
        let args: Args
            = reg.defaults.iter()
            .filter(|(k, _)| !given.contains_key(*k))
            .chain(given.iter())
            .map(|(k, v)| (namespaced(namespace, k), *v))
            .collect();
        let envelope = Envelope {
            func: func.to_string(),
            namespace: namespace.to_string(),
            f: Rc::clone(&reg.f),
        };
        Ok((envelope, args))
    }
}
