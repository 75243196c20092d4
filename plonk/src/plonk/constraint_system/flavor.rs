//! Static per-flavor tables: wire width, selector set, supported gates and the
//! permutation encoding used when building keys.

/// Selector columns known to any flavor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Selector {
    QM,
    QC,
    Q1,
    Q2,
    Q3,
    Q4,
    Q5,
    QArith,
    QFixedBase,
    QRange,
    QLogic,
    QSort,
    QElliptic,
    QAux,
}

impl Selector {
    /// Name used for the selector polynomial in the polynomial store.
    pub fn name(&self) -> &'static str {
        match self {
            Selector::QM => "q_m",
            Selector::QC => "q_c",
            Selector::Q1 => "q_1",
            Selector::Q2 => "q_2",
            Selector::Q3 => "q_3",
            Selector::Q4 => "q_4",
            Selector::Q5 => "q_5",
            Selector::QArith => "q_arith",
            Selector::QFixedBase => "q_fixed_base",
            Selector::QRange => "q_range",
            Selector::QLogic => "q_logic",
            Selector::QSort => "q_sort",
            Selector::QElliptic => "q_elliptic",
            Selector::QAux => "q_aux",
        }
    }
}

/// Gate families; each flavor supports a subset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// Three-wire arithmetic: add, mul, bool, poly and constants.
    Arithmetic,
    /// Four-wire arithmetic: big add and big mul.
    WideArithmetic,
    /// Four-wire add whose fourth wire is restricted to two bits.
    BalancedAdd,
    /// Big add chained with the fourth wire of the next row.
    ChainedArithmetic,
    /// Base-4 range accumulator rows.
    Range,
    /// Base-4 AND/XOR accumulator rows.
    Logic,
    /// Sorted-list delta rows used by range lists.
    Sort,
    /// Elliptic curve addition rows.
    Elliptic,
    /// ROM/RAM record rows.
    Memory,
}

/// How permutation entries are encoded into field elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermutationEncoding {
    /// `k_column * omega^row`, the coset encoding of PLONK.
    Plonk,
    /// `row + n * column`, the integer encoding of Honk.
    Honk,
}

/// Static description of a flavor.
#[derive(Debug)]
pub struct FlavorConfig {
    /// The flavor this table describes.
    pub kind: CircuitFlavor,
    /// Human readable name.
    pub name: &'static str,
    /// Number of wire columns.
    pub program_width: usize,
    /// Selector columns, in storage order.
    pub selectors: &'static [Selector],
    /// Gate families this flavor can emit.
    pub gates: &'static [GateKind],
    /// Permutation encoding.
    pub encoding: PermutationEncoding,
    /// Whether cycles carry tags (generalized permutation).
    pub generalized: bool,
    /// Rows reserved at the end of the circuit for the outer protocol.
    pub num_reserved_gates: usize,
}

impl FlavorConfig {
    /// Column index of `selector`, if the flavor has it.
    pub fn selector_column(&self, selector: Selector) -> Option<usize> {
        self.selectors.iter().position(|s| *s == selector)
    }

    /// Whether the flavor can emit gates of `kind`.
    pub fn supports(&self, kind: GateKind) -> bool {
        self.gates.contains(&kind)
    }
}

const STANDARD_SELECTORS: &[Selector] = &[
    Selector::QM,
    Selector::Q1,
    Selector::Q2,
    Selector::Q3,
    Selector::QC,
];

const TURBO_SELECTORS: &[Selector] = &[
    Selector::QM,
    Selector::QC,
    Selector::Q1,
    Selector::Q2,
    Selector::Q3,
    Selector::Q4,
    Selector::Q5,
    Selector::QArith,
    Selector::QFixedBase,
    Selector::QRange,
    Selector::QLogic,
];

const ULTRA_SELECTORS: &[Selector] = &[
    Selector::QM,
    Selector::QC,
    Selector::Q1,
    Selector::Q2,
    Selector::Q3,
    Selector::Q4,
    Selector::QArith,
    Selector::QSort,
    Selector::QElliptic,
    Selector::QAux,
];

static STANDARD: FlavorConfig = FlavorConfig {
    kind: CircuitFlavor::Standard,
    name: "standard",
    program_width: 3,
    selectors: STANDARD_SELECTORS,
    gates: &[GateKind::Arithmetic],
    encoding: PermutationEncoding::Plonk,
    generalized: false,
    num_reserved_gates: 4,
};

static TURBO: FlavorConfig = FlavorConfig {
    kind: CircuitFlavor::Turbo,
    name: "turbo",
    program_width: 4,
    selectors: TURBO_SELECTORS,
    gates: &[
        GateKind::Arithmetic,
        GateKind::WideArithmetic,
        GateKind::BalancedAdd,
        GateKind::Range,
        GateKind::Logic,
    ],
    encoding: PermutationEncoding::Plonk,
    generalized: false,
    num_reserved_gates: 4,
};

static ULTRA: FlavorConfig = FlavorConfig {
    kind: CircuitFlavor::Ultra,
    name: "ultra",
    program_width: 4,
    selectors: ULTRA_SELECTORS,
    gates: &[
        GateKind::Arithmetic,
        GateKind::WideArithmetic,
        GateKind::ChainedArithmetic,
        GateKind::Sort,
        GateKind::Elliptic,
        GateKind::Memory,
    ],
    encoding: PermutationEncoding::Plonk,
    generalized: true,
    num_reserved_gates: 4,
};

static STANDARD_HONK: FlavorConfig = FlavorConfig {
    kind: CircuitFlavor::StandardHonk,
    name: "standard-honk",
    program_width: 3,
    selectors: STANDARD_SELECTORS,
    gates: &[GateKind::Arithmetic],
    encoding: PermutationEncoding::Honk,
    generalized: false,
    num_reserved_gates: 2,
};

/// The circuit flavor, chosen when the builder is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CircuitFlavor {
    Standard,
    #[default]
    Turbo,
    Ultra,
    StandardHonk,
}

impl CircuitFlavor {
    /// The static table of the flavor.
    pub fn config(&self) -> &'static FlavorConfig {
        match self {
            CircuitFlavor::Standard => &STANDARD,
            CircuitFlavor::Turbo => &TURBO,
            CircuitFlavor::Ultra => &ULTRA,
            CircuitFlavor::StandardHonk => &STANDARD_HONK,
        }
    }
}

/// Run-time configuration of a circuit builder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitConfig {
    /// The flavor of the circuit.
    pub flavor: CircuitFlavor,
    /// Lower bound for the padded circuit size.
    pub minimum_circuit_size: usize,
    /// Expected number of gates, used to reserve column capacity.
    pub size_hint: usize,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        CircuitConfig {
            flavor: CircuitFlavor::default(),
            minimum_circuit_size: 0,
            size_hint: 0,
        }
    }
}

impl CircuitConfig {
    /// Config for `flavor` with default sizing.
    pub fn new(flavor: CircuitFlavor) -> Self {
        CircuitConfig {
            flavor,
            ..Default::default()
        }
    }
}
