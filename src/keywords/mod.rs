//! SCHEDULE keyword record model
//!
//! One struct per keyword, each with a declared positional item order
//! (`tokens()`), gathered in the closed [`Record`] sum type. Manual operator
//! commands travel as [`Record::Verbatim`], bypassing the typed items.
//!
//! Rendering to text lives in [`writer`].

mod token;
pub mod writer;

pub use token::*;
pub use writer::{EmitStats, KeywordWriter};

use chrono::{NaiveDate, NaiveTime};

use crate::types::TrajectoryPoint;

/// Well item of a control keyword: a named well or every well (`*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WellTarget {
    All,
    Named(String),
}

impl WellTarget {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl ToToken for WellTarget {
    fn to_token(&self) -> String {
        match self {
            Self::All => WILDCARD.to_string(),
            Self::Named(name) => name.clone(),
        }
    }
}

/// A keyword whose body is a single positional item line.
pub trait TableKeyword {
    const NAME: &'static str;

    /// Item tokens in simulator order, unset items as `*`.
    fn tokens(&self) -> Vec<String>;
}

// ============================================================================
// WELSPECS
// ============================================================================

/// `WELSPECS`: introduces a well and its group.
#[derive(Debug, Clone, PartialEq)]
pub struct WellSpec {
    pub well: String,
    pub group: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub ref_depth: Option<f64>,
    pub phase: Option<Phase>,
    pub drainage_radius: Option<f64>,
    pub inflow_equation: Option<String>,
    pub shut_in: Option<String>,
    pub crossflow: Option<String>,
    pub pvt_table: Option<u32>,
    pub density_calc: Option<String>,
    pub fip_region: Option<u32>,
}

impl WellSpec {
    /// Well in `group` with liquid as preferred phase, everything else defaulted.
    pub fn new(well: impl Into<String>, group: Option<String>) -> Self {
        Self {
            well: well.into(),
            group,
            x: None,
            y: None,
            ref_depth: None,
            phase: Some(Phase::Liq),
            drainage_radius: None,
            inflow_equation: None,
            shut_in: None,
            crossflow: None,
            pvt_table: None,
            density_calc: None,
            fip_region: None,
        }
    }
}

impl TableKeyword for WellSpec {
    const NAME: &'static str = "WELSPECS";

    fn tokens(&self) -> Vec<String> {
        vec![
            self.well.to_token(),
            self.group.to_token(),
            self.x.to_token(),
            self.y.to_token(),
            self.ref_depth.to_token(),
            self.phase.to_token(),
            self.drainage_radius.to_token(),
            self.inflow_equation.to_token(),
            self.shut_in.to_token(),
            self.crossflow.to_token(),
            self.pvt_table.to_token(),
            self.density_calc.to_token(),
            self.fip_region.to_token(),
        ]
    }
}

// ============================================================================
// WELLTRACK
// ============================================================================

/// `WELLTRACK`: single-branch well path, one line per station.
#[derive(Debug, Clone, PartialEq)]
pub struct WellTrack {
    pub well: String,
    pub points: Vec<TrajectoryPoint>,
}

impl WellTrack {
    pub const NAME: &'static str = "WELLTRACK";
}

// ============================================================================
// DATES
// ============================================================================

/// `DATES`: advances the simulation to a report date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateStamp {
    pub date: NaiveDate,
    /// Written as `HH:MM:SS` after the year when present
    pub time: Option<NaiveTime>,
}

impl DateStamp {
    pub const NAME: &'static str = "DATES";

    pub const fn on(date: NaiveDate) -> Self {
        Self { date, time: None }
    }
}

// ============================================================================
// WCONHIST
// ============================================================================

/// `WCONHIST`: observed production rates for a producer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionControl {
    pub well: WellTarget,
    pub status: Status,
    pub mode: ProductionMode,
    pub oil_rate: Option<f64>,
    pub water_rate: Option<f64>,
    pub gas_rate: Option<f64>,
    pub vfp_table: Option<u32>,
    pub alq: Option<f64>,
    pub thp: Option<f64>,
    pub bhp: Option<f64>,
    pub wet_gas_rate: Option<f64>,
    pub ngl_rate: Option<f64>,
}

impl ProductionControl {
    /// `* SHUT LRAT`: clears last period's production state for every well.
    pub const fn reset() -> Self {
        Self {
            well: WellTarget::All,
            status: Status::Shut,
            mode: ProductionMode::Lrat,
            oil_rate: None,
            water_rate: None,
            gas_rate: None,
            vfp_table: None,
            alq: None,
            thp: None,
            bhp: None,
            wet_gas_rate: None,
            ngl_rate: None,
        }
    }
}

impl TableKeyword for ProductionControl {
    const NAME: &'static str = "WCONHIST";

    fn tokens(&self) -> Vec<String> {
        vec![
            self.well.to_token(),
            self.status.to_token(),
            self.mode.to_token(),
            self.oil_rate.to_token(),
            self.water_rate.to_token(),
            self.gas_rate.to_token(),
            self.vfp_table.to_token(),
            self.alq.to_token(),
            self.thp.to_token(),
            self.bhp.to_token(),
            self.wet_gas_rate.to_token(),
            self.ngl_rate.to_token(),
        ]
    }
}

// ============================================================================
// WCONINJH
// ============================================================================

/// `WCONINJH`: observed injection rate for an injector.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionControl {
    pub well: WellTarget,
    pub fluid: InjectedFluid,
    pub status: Status,
    pub rate: Option<f64>,
    pub bhp: Option<f64>,
    pub thp: Option<f64>,
    pub vfp_table: Option<u32>,
    pub second_phase_concentration: Option<f64>,
    pub surface_oil_fraction: Option<f64>,
    pub surface_water_fraction: Option<f64>,
    pub surface_gas_fraction: Option<f64>,
    pub mode: Option<InjectionMode>,
}

impl InjectionControl {
    /// `* WATER SHUT ... RATE`: clears last period's injection state.
    pub const fn reset() -> Self {
        Self {
            well: WellTarget::All,
            fluid: InjectedFluid::Water,
            status: Status::Shut,
            rate: None,
            bhp: None,
            thp: None,
            vfp_table: None,
            second_phase_concentration: None,
            surface_oil_fraction: None,
            surface_water_fraction: None,
            surface_gas_fraction: None,
            mode: Some(InjectionMode::Rate),
        }
    }
}

impl TableKeyword for InjectionControl {
    const NAME: &'static str = "WCONINJH";

    fn tokens(&self) -> Vec<String> {
        vec![
            self.well.to_token(),
            self.fluid.to_token(),
            self.status.to_token(),
            self.rate.to_token(),
            self.bhp.to_token(),
            self.thp.to_token(),
            self.vfp_table.to_token(),
            self.second_phase_concentration.to_token(),
            self.surface_oil_fraction.to_token(),
            self.surface_water_fraction.to_token(),
            self.surface_gas_fraction.to_token(),
            self.mode.to_token(),
        ]
    }
}

// ============================================================================
// WEFAC
// ============================================================================

/// `WEFAC`: fraction of the timestep a well is on stream.
#[derive(Debug, Clone, PartialEq)]
pub struct EfficiencyFactor {
    pub well: WellTarget,
    pub factor: Numeric,
    pub network: Option<String>,
}

impl EfficiencyFactor {
    /// `* 1`: every well back to full-period operation.
    pub const fn reset() -> Self {
        Self {
            well: WellTarget::All,
            factor: Numeric::Int(1),
            network: None,
        }
    }
}

impl TableKeyword for EfficiencyFactor {
    const NAME: &'static str = "WEFAC";

    fn tokens(&self) -> Vec<String> {
        vec![
            self.well.to_token(),
            self.factor.to_token(),
            self.network.to_token(),
        ]
    }
}

// ============================================================================
// COMPDATMD
// ============================================================================

/// `COMPDATMD`: completion interval given by measured depths.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionInterval {
    pub well: String,
    pub branch: Option<u32>,
    pub md_top: Option<f64>,
    pub md_bottom: Option<f64>,
    pub depth_type: Option<DepthType>,
    pub status: Option<Status>,
    pub sat_table: Option<u32>,
    pub transmissibility_factor: Option<f64>,
    pub diameter: Option<Numeric>,
    pub kh: Option<f64>,
    pub skin: Option<Numeric>,
    pub d_factor: Option<f64>,
    pub multiplier: Option<Numeric>,
    pub completion_type: Option<String>,
}

impl CompletionInterval {
    /// Interval on `well` with every optional item defaulted.
    pub fn new(well: impl Into<String>) -> Self {
        Self {
            well: well.into(),
            branch: None,
            md_top: None,
            md_bottom: None,
            depth_type: None,
            status: None,
            sat_table: None,
            transmissibility_factor: None,
            diameter: None,
            kh: None,
            skin: None,
            d_factor: None,
            multiplier: None,
            completion_type: None,
        }
    }
}

impl TableKeyword for CompletionInterval {
    const NAME: &'static str = "COMPDATMD";

    fn tokens(&self) -> Vec<String> {
        vec![
            self.well.to_token(),
            self.branch.to_token(),
            self.md_top.to_token(),
            self.md_bottom.to_token(),
            self.depth_type.to_token(),
            self.status.to_token(),
            self.sat_table.to_token(),
            self.transmissibility_factor.to_token(),
            self.diameter.to_token(),
            self.kh.to_token(),
            self.skin.to_token(),
            self.d_factor.to_token(),
            self.multiplier.to_token(),
            self.completion_type.to_token(),
        ]
    }
}

// ============================================================================
// Record
// ============================================================================

/// Every emittable keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    WellSpec(WellSpec),
    WellTrack(WellTrack),
    Dates(DateStamp),
    Production(ProductionControl),
    Injection(InjectionControl),
    Efficiency(EfficiencyFactor),
    Completion(CompletionInterval),
    /// Caller-supplied keyword and argument text, written unmodified
    Verbatim { keyword: String, args: String },
}

impl Record {
    /// Keyword name as written on the first line.
    pub fn keyword(&self) -> &str {
        match self {
            Self::WellSpec(_) => WellSpec::NAME,
            Self::WellTrack(_) => WellTrack::NAME,
            Self::Dates(_) => DateStamp::NAME,
            Self::Production(_) => ProductionControl::NAME,
            Self::Injection(_) => InjectionControl::NAME,
            Self::Efficiency(_) => EfficiencyFactor::NAME,
            Self::Completion(_) => CompletionInterval::NAME,
            Self::Verbatim { keyword, .. } => keyword,
        }
    }

    /// True for the wildcard-well records that clear the previous period.
    pub fn is_reset(&self) -> bool {
        match self {
            Self::Production(r) => r.well == WellTarget::All,
            Self::Injection(r) => r.well == WellTarget::All,
            Self::Efficiency(r) => r.well == WellTarget::All,
            _ => false,
        }
    }
}
