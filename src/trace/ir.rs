//! Vocabulary of the emitted transform script.
//!
//! A [`DagNode`] is never stored: the tracer builds one per operator call and
//! renders it straight into the script text. The `Display` impls in this
//! module are the compatibility contract with the external code generator,
//! so spacing and punctuation are reproduced exactly, including the
//! per-operator differences.

use crate::shape::{IndexBox, Point};
use std::fmt;

/// Name of a traced array. Renders as `var_<id>`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub u64);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var_{}", self.0)
    }
}

/// How the lanes of a batched operator are laid out in memory.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Distribution {
    /// Each lane is one contiguous block (`APar`).
    #[default]
    Contiguous,
    /// Element `i` of lane `b` sits at `i * batch + b` (`AVec`).
    Interleaved,
}

impl Distribution {
    /// Script token for this distribution.
    pub fn token(&self) -> &'static str {
        match self {
            Distribution::Contiguous => "APar",
            Distribution::Interleaved => "AVec",
        }
    }

    /// Offset of element `elem` of lane `lane` in a buffer holding `batch`
    /// lanes of `block` elements each.
    #[inline]
    pub fn offset(&self, lane: usize, elem: usize, batch: usize, block: usize) -> usize {
        match self {
            Distribution::Contiguous => lane * block + elem,
            Distribution::Interleaved => elem * batch + lane,
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Read and write distributions of a batched operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct BatchLayout {
    /// Layout of the source lanes
    pub read: Distribution,
    /// Layout of the destination lanes
    pub write: Distribution,
}

impl BatchLayout {
    /// Layout with the given read and write distributions.
    pub const fn new(read: Distribution, write: Distribution) -> Self {
        Self { read, write }
    }

    /// Both sides contiguous.
    pub const fn contiguous() -> Self {
        Self::new(Distribution::Contiguous, Distribution::Contiguous)
    }

    /// Both sides interleaved.
    pub const fn interleaved() -> Self {
        Self::new(Distribution::Interleaved, Distribution::Interleaved)
    }
}

/// Shape of the DAG being traced, which decides the pointer depth of the
/// generated entry point.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum DagKind {
    /// Entry point takes arrays of buffer pointers (`double**`).
    #[default]
    Batched,
    /// Entry point takes single buffer pointers (`double*`).
    Scalar,
}

/// One recorded operator invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum DagNode {
    /// Batched complex multi-dimensional DFT.
    MdDft {
        extents: Point,
        sign: i32,
        batch: usize,
        layout: BatchLayout,
        dst: VarId,
        src: VarId,
    },
    /// Batched real-to-complex multi-dimensional DFT.
    MdPrDft {
        extents: Point,
        batch: usize,
        layout: BatchLayout,
        dst: VarId,
        src: VarId,
    },
    /// Batched complex-to-real multi-dimensional DFT.
    IMdPrDft {
        extents: Point,
        batch: usize,
        layout: BatchLayout,
        dst: VarId,
        src: VarId,
    },
    /// Single real-to-complex DFT.
    PrDft { extents: Point, dst: VarId, src: VarId },
    /// Single complex-to-real DFT.
    IPrDft { extents: Point, dst: VarId, src: VarId },
    /// Point-wise multiply by a real symbol.
    RealDiag { symbol_size: usize, dst: VarId, src: VarId },
    /// Point-wise multiply by a complex symbol.
    ComplexDiag { symbol_size: usize, dst: VarId, src: VarId },
    /// Place `src` into a zeroed box of `extents`.
    ZeroEmbedBox {
        extents: Point,
        region: IndexBox,
        dst: VarId,
        src: VarId,
    },
    /// Cut `region` out of a box of `extents`.
    ExtractBox {
        extents: Point,
        region: IndexBox,
        dst: VarId,
        src: VarId,
    },
    /// Fourier resampling with a fractional shift.
    Resample {
        dst_extents: Point,
        src_extents: Point,
        shift: Vec<f64>,
        dst: VarId,
        src: VarId,
    },
    /// Plain copy over a box.
    Gather { extents: Point, dst: VarId, src: VarId },
}

impl DagNode {
    /// Operator name used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            DagNode::MdDft { sign, .. } if *sign > 0 => "IMDDFT",
            DagNode::MdDft { .. } => "MDDFT",
            DagNode::MdPrDft { .. } | DagNode::PrDft { .. } => "MDPRDFT",
            DagNode::IMdPrDft { .. } | DagNode::IPrDft { .. } => "IMDPRDFT",
            DagNode::RealDiag { .. } => "Diag",
            DagNode::ComplexDiag { .. } => "RCDiag",
            DagNode::ZeroEmbedBox { .. } => "ZeroEmbedBox",
            DagNode::ExtractBox { .. } => "ExtractBox",
            DagNode::Resample { .. } => "TResample",
            DagNode::Gather { .. } => "TGath",
        }
    }

    /// Destination and source operands.
    pub fn operands(&self) -> (VarId, VarId) {
        match self {
            DagNode::MdDft { dst, src, .. }
            | DagNode::MdPrDft { dst, src, .. }
            | DagNode::IMdPrDft { dst, src, .. }
            | DagNode::PrDft { dst, src, .. }
            | DagNode::IPrDft { dst, src, .. }
            | DagNode::RealDiag { dst, src, .. }
            | DagNode::ComplexDiag { dst, src, .. }
            | DagNode::ZeroEmbedBox { dst, src, .. }
            | DagNode::ExtractBox { dst, src, .. }
            | DagNode::Resample { dst, src, .. }
            | DagNode::Gather { dst, src, .. } => (*dst, *src),
        }
    }
}

/// Renders `[[lo..hi],[lo..hi]]`.
struct Ranges<'a>(&'a IndexBox);

impl fmt::Display for Ranges<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(f, "[")?;
        for d in 0..b.dim() {
            if d > 0 {
                write!(f, ",")?;
            }
            write!(f, "[{}..{}]", b.lo()[d], b.hi()[d])?;
        }
        write!(f, "]")
    }
}

/// Renders shifts with two fixed decimals: `[0.50,-1.25]`.
struct Shifts<'a>(&'a [f64]);

impl fmt::Display for Shifts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, s) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{:.2}", s)?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for DagNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DagNode::MdDft { extents, sign, batch, layout, dst, src } => writeln!(
                f,
                "   TDAGNode(TTensorI(MDDFT({},{}),{},{}, {}), {},{}),",
                extents, sign, batch, layout.read, layout.write, dst, src
            ),
            DagNode::MdPrDft { extents, batch, layout, dst, src } => writeln!(
                f,
                "    TDAGNode(TTensorI(MDPRDFT({},-1),{},{},{}), {},{}),",
                extents, batch, layout.read, layout.write, dst, src
            ),
            DagNode::IMdPrDft { extents, batch, layout, dst, src } => writeln!(
                f,
                "    TDAGNode(TTensorI(IMDPRDFT({},1),{},{},{}), {},{}),",
                extents, batch, layout.read, layout.write, dst, src
            ),
            DagNode::PrDft { extents, dst, src } => {
                writeln!(f, "    TDAGNode(MDPRDFT({},-1), {},{}),", extents, dst, src)
            }
            DagNode::IPrDft { extents, dst, src } => {
                writeln!(f, "    TDAGNode(IMDPRDFT({},1), {},{}),", extents, dst, src)
            }
            DagNode::RealDiag { symbol_size, dst, src } => writeln!(
                f,
                "    TDAGNode(Diag(diagTensor(FDataOfs(symvar,{},0),fConst(TReal, 2, 1))), {},{}),",
                symbol_size, dst, src
            ),
            DagNode::ComplexDiag { symbol_size, dst, src } => writeln!(
                f,
                "    TDAGNode(RCDiag(FDataOfs(symvar,{},0)), {},{}),",
                2 * symbol_size,
                dst,
                src
            ),
            DagNode::ZeroEmbedBox { extents, region, dst, src } => writeln!(
                f,
                "    TDAGNode(ZeroEmbedBox({},{}), {},{}),",
                extents,
                Ranges(region),
                dst,
                src
            ),
            DagNode::ExtractBox { extents, region, dst, src } => writeln!(
                f,
                "    TDAGNode(ExtractBox({},{}), {},{}),",
                extents,
                Ranges(region),
                dst,
                src
            ),
            DagNode::Resample { dst_extents, src_extents, shift, dst, src } => writeln!(
                f,
                "    TDAGNode(TResample({},{},{}),{},{}),",
                dst_extents,
                src_extents,
                Shifts(shift),
                dst,
                src
            ),
            DagNode::Gather { extents, dst, src } => {
                writeln!(f, "    TDAGNode(TGath(fBox({})),{}, {}),", extents, dst, src)
            }
        }
    }
}
