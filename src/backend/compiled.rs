//! Binding to a transform compiled from a traced script.

use crate::backend::TransformBackend;
use crate::error::{FftxError, Result};
use crate::trace::{DagKind, InterfaceStub};
use libloading::{Library, Symbol};
use std::path::{Path, PathBuf};
use std::ptr;

type InitFn = unsafe extern "C" fn();
type DestroyFn = unsafe extern "C" fn();
type BatchedFn = unsafe extern "C" fn(*mut *mut f64, *mut *mut f64, *mut *mut f64);
type ScalarFn = unsafe extern "C" fn(*mut f64, *mut f64, *mut f64);

#[derive(Debug, Copy, Clone)]
enum Entry {
    Batched(BatchedFn),
    Scalar(ScalarFn),
}

/// A loaded shared library exporting the three entry points described by an
/// [`InterfaceStub`].
///
/// The init routine runs on load and the destroy routine on drop.
#[derive(Debug)]
pub struct CompiledTransform {
    name: String,
    path: PathBuf,
    entry: Entry,
    destroy: DestroyFn,
    // Keeps the function pointers above valid; dropped after `destroy` runs.
    _library: Library,
}

impl CompiledTransform {
    /// Load the library at `path` and run its init routine.
    ///
    /// # Safety
    ///
    /// The library must export `init_<entry>`, `<entry>` and
    /// `destroy_<entry>` with the C signatures of `stub`, and loading it
    /// must not run unsound initialization code.
    pub unsafe fn load(path: impl AsRef<Path>, stub: &InterfaceStub) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let library = unsafe { Library::new(&path)? };

        let (init, entry, destroy) = unsafe {
            let init: Symbol<InitFn> = library.get(stub.init_symbol().as_bytes())?;
            let destroy: Symbol<DestroyFn> = library.get(stub.destroy_symbol().as_bytes())?;
            let entry = match stub.kind() {
                DagKind::Batched => {
                    let f: Symbol<BatchedFn> = library.get(stub.entry_symbol().as_bytes())?;
                    Entry::Batched(*f)
                }
                DagKind::Scalar => {
                    let f: Symbol<ScalarFn> = library.get(stub.entry_symbol().as_bytes())?;
                    Entry::Scalar(*f)
                }
            };
            (*init, entry, *destroy)
        };

        unsafe { init() };
        log::info!("loaded {} from {}", stub.entry_symbol(), path.display());
        Ok(Self {
            name: stub.entry_symbol(),
            path,
            entry,
            destroy,
            _library: library,
        })
    }

    /// Path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TransformBackend for CompiledTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(
        &mut self,
        outputs: &mut [&mut [f64]],
        inputs: &[&[f64]],
        symbols: &[&[f64]],
    ) -> Result<()> {
        if outputs.is_empty() || inputs.is_empty() {
            return Err(FftxError::InvalidLayout(format!(
                "{} needs at least one output and one input buffer",
                self.name
            )));
        }
        match self.entry {
            Entry::Batched(f) => {
                let mut y: Vec<*mut f64> = outputs.iter_mut().map(|b| b.as_mut_ptr()).collect();
                // The generated code only reads X and symvar.
                let mut x: Vec<*mut f64> =
                    inputs.iter().map(|b| b.as_ptr() as *mut f64).collect();
                let mut sym: Vec<*mut f64> =
                    symbols.iter().map(|b| b.as_ptr() as *mut f64).collect();
                let sym_ptr = if sym.is_empty() { ptr::null_mut() } else { sym.as_mut_ptr() };
                unsafe { f(y.as_mut_ptr(), x.as_mut_ptr(), sym_ptr) };
            }
            Entry::Scalar(f) => {
                let y = outputs[0].as_mut_ptr();
                let x = inputs[0].as_ptr() as *mut f64;
                let sym = symbols
                    .first()
                    .map_or(ptr::null_mut(), |s| s.as_ptr() as *mut f64);
                unsafe { f(y, x, sym) };
            }
        }
        Ok(())
    }
}

impl Drop for CompiledTransform {
    fn drop(&mut self) {
        unsafe { (self.destroy)() };
        log::debug!("destroyed {}", self.name);
    }
}
