//! Gate input records, named after the relation they feed.
use crate::plonk::constraint_system::VarIndex;

/// `a_scaling * a + b_scaling * b + c_scaling * c + const_scaling = 0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddTriple<F> {
    pub a: VarIndex,
    pub b: VarIndex,
    pub c: VarIndex,
    pub a_scaling: F,
    pub b_scaling: F,
    pub c_scaling: F,
    pub const_scaling: F,
}

/// `mul_scaling * a * b + c_scaling * c + const_scaling = 0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MulTriple<F> {
    pub a: VarIndex,
    pub b: VarIndex,
    pub c: VarIndex,
    pub mul_scaling: F,
    pub c_scaling: F,
    pub const_scaling: F,
}

/// `q_m * a * b + q_l * a + q_r * b + q_o * c + q_c = 0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolyTriple<F> {
    pub a: VarIndex,
    pub b: VarIndex,
    pub c: VarIndex,
    pub q_m: F,
    pub q_l: F,
    pub q_r: F,
    pub q_o: F,
    pub q_c: F,
}

/// Four-wire linear relation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddQuad<F> {
    pub a: VarIndex,
    pub b: VarIndex,
    pub c: VarIndex,
    pub d: VarIndex,
    pub a_scaling: F,
    pub b_scaling: F,
    pub c_scaling: F,
    pub d_scaling: F,
    pub const_scaling: F,
}

/// Four-wire relation with a product of the first two wires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MulQuad<F> {
    pub a: VarIndex,
    pub b: VarIndex,
    pub c: VarIndex,
    pub d: VarIndex,
    pub mul_scaling: F,
    pub a_scaling: F,
    pub b_scaling: F,
    pub c_scaling: F,
    pub d_scaling: F,
    pub const_scaling: F,
}

/// `(x3, y3) = (x1, y1) + (endomorphism_coefficient * x2, sign_coefficient * y2)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EccAddGate<F> {
    pub x1: VarIndex,
    pub y1: VarIndex,
    pub x2: VarIndex,
    pub y2: VarIndex,
    pub x3: VarIndex,
    pub y3: VarIndex,
    pub endomorphism_coefficient: F,
    pub sign_coefficient: F,
}

/// Accumulator witnesses of a logic constraint, most significant window first.
/// The last entries of `left` and `right` are the operands, the last entry of
/// `out` is the result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccumulatorTriple {
    pub left: Vec<VarIndex>,
    pub right: Vec<VarIndex>,
    pub out: Vec<VarIndex>,
}
