//! Closing a trace: the script trailer and the C interface stub.

use crate::dtype::DType;
use crate::error::{FftxError, Result};
use crate::trace::ir::{DagKind, VarId};
use crate::trace::tracer::TraceContext;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to a program name to form its generated entry symbol.
pub const ENTRY_SUFFIX: &str = "_spiral";

/// Close a batched DAG. `roots` are the variables the generated code must
/// keep alive, normally the outputs followed by the inputs.
///
/// # Examples
///
/// ```
/// # use fftx_rs::{close_dag, Array, IndexBox, TraceContext, Complex64};
/// # use fftx_rs::ops::mddft;
/// # use fftx_rs::trace::BatchLayout;
/// let mut ctx = TraceContext::new();
/// ctx.begin_trace().unwrap();
/// let d = IndexBox::from_extents(&[8]).unwrap();
/// let x: Array<'_, Complex64> = Array::new(&mut ctx, d.clone()).unwrap();
/// let mut y: Array<'_, Complex64> = Array::new(&mut ctx, d.clone()).unwrap();
/// ctx.set_input(&x).unwrap();
/// ctx.set_output(&y).unwrap();
/// mddft(&mut ctx, &d.extents(), 1, BatchLayout::contiguous(), &mut y, &x).unwrap();
/// let closed = close_dag(&mut ctx, &[y.id().unwrap(), x.id().unwrap()], "fwd8").unwrap();
/// assert!(closed.script().ends_with("prefix:=\"fwd8\";\n"));
/// assert!(!ctx.is_tracing());
/// ```
pub fn close_dag(ctx: &mut TraceContext, roots: &[VarId], name: &str) -> Result<ClosedTrace> {
    check_name(name)?;
    let trailer = format!(
        "\n]),\n   [{}]\n),\n\
         rec(XType:= TPtr(TPtr(TReal)), YType:=TPtr(TPtr(TReal)), fname:=\"{}{}\", params:= [symvar])\n);\n\
         prefix:=\"{}\";\n",
        join_roots(roots, ", "),
        name,
        ENTRY_SUFFIX,
        name
    );
    finish(ctx, &trailer, name)
}

/// Close a DAG opened with [`TraceContext::open_scalar_dag`].
pub fn close_scalar_dag(ctx: &mut TraceContext, roots: &[VarId], name: &str) -> Result<ClosedTrace> {
    check_name(name)?;
    let trailer = format!(
        "\n]),\n   [{}]\n),\n\
         rec(fname:=\"{}{}\", params:= [symvar])\n);\n\
         prefix:=\"{}\";\n",
        join_roots(roots, ","),
        name,
        ENTRY_SUFFIX,
        name
    );
    finish(ctx, &trailer, name)
}

fn finish(ctx: &mut TraceContext, trailer: &str, name: &str) -> Result<ClosedTrace> {
    let done = ctx.finish(trailer)?;
    log::info!(
        "closed trace {} with {} nodes ({} bytes of script)",
        name,
        done.nodes,
        done.script.len()
    );
    let stub = InterfaceStub {
        name: name.to_string(),
        kind: done.kind,
        input: done.input_type,
        output: done.output_type,
        rank: done.rank,
    };
    Ok(ClosedTrace { script: done.script, stub, nodes: done.nodes })
}

fn check_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(FftxError::InvalidLayout(format!(
            "program name {:?} is not a C identifier",
            name
        )));
    }
    Ok(())
}

fn join_roots(roots: &[VarId], sep: &str) -> String {
    roots
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

/// A finished trace: the complete script plus the interface of the code
/// that will be generated from it.
#[derive(Debug, Clone)]
pub struct ClosedTrace {
    script: String,
    stub: InterfaceStub,
    nodes: usize,
}

impl ClosedTrace {
    /// Full script text.
    pub fn script(&self) -> &str {
        &self.script
    }

    /// Interface stub of the generated entry points.
    pub fn stub(&self) -> &InterfaceStub {
        &self.stub
    }

    /// Number of DAG nodes in the script.
    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// Program name.
    pub fn name(&self) -> &str {
        &self.stub.name
    }

    /// Script file name, `<name>.g`.
    pub fn script_file_name(&self) -> String {
        format!("{}.g", self.stub.name)
    }

    /// Write the script into `dir`, returning the file path.
    pub fn write_script(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.script_file_name());
        fs::write(&path, &self.script)?;
        log::info!("wrote {}", path.display());
        Ok(path)
    }

    /// Write the interface stub into `dir`, returning the file path.
    pub fn write_stub(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.stub.file_name());
        fs::write(&path, self.stub.render())?;
        log::info!("wrote {}", path.display());
        Ok(path)
    }

    /// Consume the trace, keeping the script text.
    pub fn into_script(self) -> String {
        self.script
    }
}

/// The C declarations of a generated transform: `init_<entry>`,
/// `<entry>` and `destroy_<entry>`, where `<entry>` is the program name
/// followed by [`ENTRY_SUFFIX`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceStub {
    name: String,
    kind: DagKind,
    input: DType,
    output: DType,
    rank: Option<usize>,
}

impl InterfaceStub {
    /// Stub for a program traced elsewhere.
    pub fn new(name: &str, kind: DagKind) -> Result<Self> {
        check_name(name)?;
        Ok(Self {
            name: name.to_string(),
            kind,
            input: DType::Real,
            output: DType::Real,
            rank: None,
        })
    }

    /// Program name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pointer depth of the entry point.
    pub fn kind(&self) -> DagKind {
        self.kind
    }

    /// Element kind bound to `X`.
    pub fn input_type(&self) -> DType {
        self.input
    }

    /// Element kind bound to `Y`.
    pub fn output_type(&self) -> DType {
        self.output
    }

    /// Symbol of the transform entry point.
    pub fn entry_symbol(&self) -> String {
        format!("{}{}", self.name, ENTRY_SUFFIX)
    }

    /// Symbol of the one-time setup routine.
    pub fn init_symbol(&self) -> String {
        format!("init_{}", self.entry_symbol())
    }

    /// Symbol of the teardown routine.
    pub fn destroy_symbol(&self) -> String {
        format!("destroy_{}", self.entry_symbol())
    }

    /// Header file name, `<name>.fftx.codegen.h`.
    pub fn file_name(&self) -> String {
        format!("{}.fftx.codegen.h", self.name)
    }

    /// Header text.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InterfaceStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = format!("{}_CODEGEN_H", self.name.to_ascii_uppercase());
        let ptr = match self.kind {
            DagKind::Batched => "double**",
            DagKind::Scalar => "double*",
        };
        writeln!(f, "#ifndef {}", guard)?;
        writeln!(f, "#define {}", guard)?;
        writeln!(f)?;
        writeln!(f, "// input: {}, output: {}", self.input.c_name(), self.output.c_name())?;
        if let Some(rank) = self.rank {
            writeln!(f, "// rank: {}", rank)?;
        }
        writeln!(f)?;
        writeln!(f, "#ifdef __cplusplus")?;
        writeln!(f, "extern \"C\" {{")?;
        writeln!(f, "#endif")?;
        writeln!(f)?;
        writeln!(f, "void {}(void);", self.init_symbol())?;
        writeln!(
            f,
            "void {}({} Y, {} X, {} symvar);",
            self.entry_symbol(),
            ptr,
            ptr,
            ptr
        )?;
        writeln!(f, "void {}(void);", self.destroy_symbol())?;
        writeln!(f)?;
        writeln!(f, "#ifdef __cplusplus")?;
        writeln!(f, "}}")?;
        writeln!(f, "#endif")?;
        writeln!(f)?;
        writeln!(f, "#endif")
    }
}
