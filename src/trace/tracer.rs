//! Trace context that records operator calls as transform-script text.
//!
//! A [`TraceContext`] is an explicit value threaded through array
//! construction and every operator. It owns the variable-id counter, the
//! script being written, and the record of the current trace's inputs,
//! outputs and DAG state. Nothing is global: two contexts never share ids
//! or script text.

use crate::array::Array;
use crate::dtype::{DType, Element};
use crate::error::{FftxError, Result};
use crate::shape::IndexBox;
use crate::trace::ir::{DagKind, DagNode, VarId};

/// Whether a context is currently recording.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TraceState {
    /// Operators execute on real memory.
    Inactive,
    /// Operators emit script text.
    Active,
}

/// Explicit tracing context.
///
/// # Examples
///
/// ```
/// # use fftx_rs::{Array, IndexBox, TraceContext};
/// # use fftx_rs::Complex64;
/// let mut ctx = TraceContext::new();
/// ctx.begin_trace().unwrap();
/// let domain = IndexBox::from_extents(&[8]).unwrap();
/// let x: Array<'_, Complex64> = Array::new(&mut ctx, domain).unwrap();
/// assert!(x.is_symbolic());
/// assert!(ctx.script().starts_with("var_1:= var(\"var_1\", BoxND([8], TReal));"));
/// ```
#[derive(Debug)]
pub struct TraceContext {
    state: TraceState,
    /// Next id handed to a declaration; never reset
    next_id: u64,
    /// First id declared in the active trace
    first_id: u64,
    script: String,
    dag_open: bool,
    kind: DagKind,
    nodes: usize,
    input_type: DType,
    output_type: DType,
    rank: Option<usize>,
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceContext {
    /// Create an inactive context. The first declared variable is `var_1`.
    pub fn new() -> Self {
        Self {
            state: TraceState::Inactive,
            next_id: 1,
            first_id: 1,
            script: String::new(),
            dag_open: false,
            kind: DagKind::Batched,
            nodes: 0,
            input_type: DType::Real,
            output_type: DType::Real,
            rank: None,
        }
    }

    /// Start recording. Arrays created from now on are symbolic.
    pub fn begin_trace(&mut self) -> Result<()> {
        if self.state == TraceState::Active {
            return Err(FftxError::TraceAlreadyActive);
        }
        self.state = TraceState::Active;
        self.first_id = self.next_id;
        self.script.clear();
        self.dag_open = false;
        self.kind = DagKind::Batched;
        self.nodes = 0;
        self.input_type = DType::Real;
        self.output_type = DType::Real;
        self.rank = None;
        log::info!("trace started at var_{}", self.next_id);
        Ok(())
    }

    /// Returns true while a trace is being recorded.
    #[inline]
    pub fn is_tracing(&self) -> bool {
        self.state == TraceState::Active
    }

    /// Current recording state.
    pub fn state(&self) -> TraceState {
        self.state
    }

    /// Script text recorded so far in the current trace.
    pub fn script(&self) -> &str {
        &self.script
    }

    /// Number of DAG nodes emitted in the current trace.
    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// Returns true once the DAG list has been opened.
    pub fn is_dag_open(&self) -> bool {
        self.dag_open
    }

    /// Id the next declaration will receive.
    pub fn peek_next_id(&self) -> VarId {
        VarId(self.next_id)
    }

    /// Open the batched DAG list. Declarations are rejected from here on.
    pub fn open_dag(&mut self) -> Result<()> {
        self.ensure_active()?;
        if self.dag_open {
            return Err(FftxError::DagAlreadyOpen);
        }
        self.kind = DagKind::Batched;
        self.dag_open = true;
        self.script.push_str("transform:= TFCall(TDecl(TDAG([\n");
        Ok(())
    }

    /// Open a DAG whose entry point takes single buffers instead of arrays
    /// of buffers.
    pub fn open_scalar_dag(&mut self) -> Result<()> {
        self.ensure_active()?;
        if self.dag_open {
            return Err(FftxError::DagAlreadyOpen);
        }
        self.kind = DagKind::Scalar;
        self.dag_open = true;
        self.script.push_str("symvar := var(\"sym\", TPtr(TReal));\n");
        self.script.push_str("transform:= TFCall(TDecl(TDAG([\n");
        Ok(())
    }

    /// Bind each array to its slot of the input tuple `X`. A single array is
    /// bound to `X` itself.
    pub fn set_inputs<T: Element>(&mut self, arrays: &[&Array<'_, T>]) -> Result<()> {
        self.bind_io(arrays, "X")?;
        self.input_type = T::DTYPE;
        Ok(())
    }

    /// Bind one array as the whole input `X`.
    pub fn set_input<T: Element>(&mut self, array: &Array<'_, T>) -> Result<()> {
        self.set_inputs(&[array])
    }

    /// Bind each array to its slot of the output tuple `Y`.
    pub fn set_outputs<T: Element>(&mut self, arrays: &[&Array<'_, T>]) -> Result<()> {
        self.bind_io(arrays, "Y")?;
        self.output_type = T::DTYPE;
        Ok(())
    }

    /// Bind one array as the whole output `Y`.
    pub fn set_output<T: Element>(&mut self, array: &Array<'_, T>) -> Result<()> {
        self.set_outputs(&[array])
    }

    fn bind_io<T: Element>(&mut self, arrays: &[&Array<'_, T>], tuple: &str) -> Result<()> {
        self.ensure_active()?;
        if arrays.is_empty() {
            return Err(FftxError::InvalidLayout(format!(
                "no arrays bound to {}",
                tuple
            )));
        }
        let ids = arrays
            .iter()
            .map(|a| a.id())
            .collect::<Result<Vec<_>>>()?;
        for &id in &ids {
            self.check_declared(id)?;
        }
        if ids.len() == 1 {
            self.script.push_str(&format!("{}:= {};\n", ids[0], tuple));
        } else {
            for (i, id) in ids.iter().enumerate() {
                self.script
                    .push_str(&format!("{}:= nth({},{});\n", id, tuple, i));
            }
        }
        self.rank = Some(arrays[0].domain().dim());
        Ok(())
    }

    /// Declare the symbol parameter as an array of real buffers.
    pub fn set_symbol(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.script
            .push_str("symvar := var(\"sym\", TPtr(TPtr(TReal)));\n");
        Ok(())
    }

    /// Add an include file for the code generator.
    pub fn include(&mut self, file: &str) -> Result<()> {
        self.ensure_active()?;
        self.script
            .push_str(&format!("opts.includes:=opts.includes::[{}];\n", file));
        Ok(())
    }

    /// Append arbitrary text, surrounded by newlines.
    pub fn raw_script(&mut self, text: &str) -> Result<()> {
        self.ensure_active()?;
        self.script.push('\n');
        self.script.push_str(text);
        self.script.push('\n');
        Ok(())
    }

    pub(crate) fn ensure_active(&self) -> Result<()> {
        if self.state != TraceState::Active {
            return Err(FftxError::TraceNotActive);
        }
        Ok(())
    }

    /// Operands must come from declarations of the active trace.
    fn check_declared(&self, id: VarId) -> Result<()> {
        if id.0 < self.first_id || id.0 >= self.next_id {
            return Err(FftxError::UndeclaredVariable(id.to_string()));
        }
        Ok(())
    }

    fn fresh_id(&mut self, domain: &IndexBox) -> Result<VarId> {
        self.ensure_active()?;
        let id = VarId(self.next_id);
        if self.dag_open {
            return Err(FftxError::DeclarationInsideDag(id.to_string()));
        }
        self.next_id += 1;
        self.script.push_str(&format!(
            "{}:= var(\"{}\", BoxND({}, TReal));\n",
            id,
            id,
            domain.extents()
        ));
        log::debug!("declared {} over {}", id, domain);
        Ok(id)
    }

    /// Declare a new symbolic array over `domain`.
    pub(crate) fn declare(&mut self, domain: &IndexBox) -> Result<VarId> {
        self.fresh_id(domain)
    }

    /// Declare a new array over `domain` that aliases component `index` of
    /// `src`.
    pub(crate) fn declare_component(
        &mut self,
        src: VarId,
        index: usize,
        domain: &IndexBox,
    ) -> Result<VarId> {
        self.ensure_active()?;
        self.check_declared(src)?;
        let id = self.fresh_id(domain)?;
        self.script
            .push_str(&format!("{}:=nth({},{});\n", id, src, index));
        Ok(id)
    }

    /// Append one DAG node, opening the batched DAG list if needed.
    pub(crate) fn emit(&mut self, node: DagNode) -> Result<()> {
        self.ensure_active()?;
        let (dst, src) = node.operands();
        self.check_declared(dst)?;
        self.check_declared(src)?;
        if !self.dag_open {
            self.open_dag()?;
        }
        log::debug!("{} {} <- {}", node.kind(), dst, src);
        self.script.push_str(&node.to_string());
        self.nodes += 1;
        Ok(())
    }

    /// Append closing text and return the finished script, leaving the
    /// context inactive.
    pub(crate) fn finish(&mut self, trailer: &str) -> Result<FinishedTrace> {
        self.ensure_active()?;
        if !self.dag_open {
            self.open_dag()?;
        }
        self.script.push_str(trailer);
        self.state = TraceState::Inactive;
        self.dag_open = false;
        Ok(FinishedTrace {
            script: std::mem::take(&mut self.script),
            kind: self.kind,
            nodes: self.nodes,
            input_type: self.input_type,
            output_type: self.output_type,
            rank: self.rank,
        })
    }

    /// Kind of DAG currently open.
    pub(crate) fn kind(&self) -> DagKind {
        self.kind
    }
}

/// Everything a closed trace hands to the closer.
#[derive(Debug)]
pub(crate) struct FinishedTrace {
    pub(crate) script: String,
    pub(crate) kind: DagKind,
    pub(crate) nodes: usize,
    pub(crate) input_type: DType,
    pub(crate) output_type: DType,
    pub(crate) rank: Option<usize>,
}
