//! Miscellaneous conveniences shared by the library and its driver binaries.

pub use num_complex::Complex64 as C64;
pub use ndarray_npy as npy;

/// Construct a [`C64`].
///
/// ```ignore
/// c!(1.0)        // 1 + 0i
/// c!(i 2.0)      // 0 + 2i
/// c!(1.0, -3.0)  // 1 - 3i
/// ```
#[macro_export]
macro_rules! c {
    ( i $im:expr ) => {
        $crate::utils::C64::new(0.0, $im)
    };
    ( $re:expr, $im:expr ) => {
        $crate::utils::C64::new($re, $im)
    };
    ( $re:expr ) => {
        $crate::utils::C64::new($re, 0.0)
    };
}

/// Create a directory and all of its parents, propagating any I/O error with
/// `?`.
#[macro_export]
macro_rules! mkdir {
    ( $path:expr ) => {
        std::fs::create_dir_all(&$path)?;
    };
}

/// Write a collection of named arrays to a single `.npz` file, propagating any
/// errors with `?`.
///
/// ```ignore
/// write_npz!(
///     outdir.join("data.npz"),
///     arrays: {
///         "time" => &time,
///         "rho" => &rho,
///     }
/// );
/// ```
#[macro_export]
macro_rules! write_npz {
    ( $path:expr, arrays: { $( $name:expr => $arr:expr ),+ $(,)? } ) => {
        {
            let mut npz = $crate::utils::npy::NpzWriter::new(
                std::fs::File::create($path)?
            );
            $( npz.add_array($name, $arr)?; )+
            npz.finish()?;
        }
    };
}

#[cfg(test)]
mod tests {
    use super::C64;

    #[test]
    fn complex_literals() {
        assert_eq!(c!(1.5), C64::new(1.5, 0.0));
        assert_eq!(c!(i 2.0), C64::new(0.0, 2.0));
        assert_eq!(c!(1.0, -3.0), C64::new(1.0, -3.0));
    }
}
