//! Lorentz-vector members of particle records.
//!
//! A record is a Lorentz vector when it carries a spatial momentum, either
//! Cartesian (`px`, `py`, `pz`) or cylindrical (`pt`, `eta`, `phi`), plus
//! `energy` or `mass`. Every member below is available in both coordinate
//! systems.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::value::Value;

/// The time-like component a record was given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Temporal {
    Energy(f64),
    Mass(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LorentzVector {
    Cartesian {
        px: f64,
        py: f64,
        pz: f64,
        temporal: Temporal,
    },
    Cylindrical {
        pt: f64,
        eta: f64,
        phi: f64,
        temporal: Temporal,
    },
}

/// Scalar members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    Px,
    Py,
    Pz,
    Energy,
    Eta,
    Phi,
    Mass,
    P,
    Pt,
    Et,
    Mt,
    Theta,
    Rapidity,
    Beta,
    Gamma,
}

impl Member {
    pub fn from_name(name: &str) -> Option<Member> {
        let member = match name {
            "px" => Member::Px,
            "py" => Member::Py,
            "pz" => Member::Pz,
            "energy" => Member::Energy,
            "eta" => Member::Eta,
            "phi" => Member::Phi,
            "mass" => Member::Mass,
            "p" => Member::P,
            "pt" => Member::Pt,
            "Et" => Member::Et,
            "mt" => Member::Mt,
            "theta" => Member::Theta,
            "rapidity" => Member::Rapidity,
            "beta" => Member::Beta,
            "gamma" => Member::Gamma,
            _ => return None,
        };
        Some(member)
    }
}

/// Members that take a second Lorentz vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LorentzMethod {
    Dot,
    DeltaPhi,
    DeltaR,
}

impl LorentzMethod {
    pub fn from_name(name: &str) -> Option<LorentzMethod> {
        match name {
            "dot" => Some(LorentzMethod::Dot),
            "delta_phi" => Some(LorentzMethod::DeltaPhi),
            "delta_r" => Some(LorentzMethod::DeltaR),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LorentzMethod::Dot => "dot",
            LorentzMethod::DeltaPhi => "delta_phi",
            LorentzMethod::DeltaR => "delta_r",
        }
    }
}

/// `sqrt` that keeps the sign of a negative argument.
fn signed_sqrt(x: f64) -> f64 {
    if x >= 0.0 { x.sqrt() } else { -(-x).sqrt() }
}

fn number(fields: &BTreeMap<String, Value>, name: &str) -> Option<f64> {
    fields.get(name).and_then(Value::as_number)
}

impl LorentzVector {
    /// Recognize a Lorentz vector among a record's fields. Cartesian
    /// momentum wins when both are present; `energy` wins over `mass`.
    pub fn classify(fields: &BTreeMap<String, Value>) -> Option<LorentzVector> {
        let temporal = number(fields, "energy")
            .map(Temporal::Energy)
            .or_else(|| number(fields, "mass").map(Temporal::Mass))?;

        if let (Some(px), Some(py), Some(pz)) = (
            number(fields, "px"),
            number(fields, "py"),
            number(fields, "pz"),
        ) {
            return Some(LorentzVector::Cartesian {
                px,
                py,
                pz,
                temporal,
            });
        }

        if let (Some(pt), Some(eta), Some(phi)) = (
            number(fields, "pt"),
            number(fields, "eta"),
            number(fields, "phi"),
        ) {
            return Some(LorentzVector::Cylindrical {
                pt,
                eta,
                phi,
                temporal,
            });
        }

        None
    }

    pub fn is_cartesian(&self) -> bool {
        matches!(self, LorentzVector::Cartesian { .. })
    }

    fn temporal(&self) -> Temporal {
        match self {
            LorentzVector::Cartesian { temporal, .. }
            | LorentzVector::Cylindrical { temporal, .. } => *temporal,
        }
    }

    pub fn px(&self) -> f64 {
        match *self {
            LorentzVector::Cartesian { px, .. } => px,
            LorentzVector::Cylindrical { pt, phi, .. } => pt * phi.cos(),
        }
    }

    pub fn py(&self) -> f64 {
        match *self {
            LorentzVector::Cartesian { py, .. } => py,
            LorentzVector::Cylindrical { pt, phi, .. } => pt * phi.sin(),
        }
    }

    pub fn pz(&self) -> f64 {
        match *self {
            LorentzVector::Cartesian { pz, .. } => pz,
            LorentzVector::Cylindrical { pt, eta, .. } => pt * eta.sinh(),
        }
    }

    pub fn pt(&self) -> f64 {
        match *self {
            LorentzVector::Cartesian { px, py, .. } => px.hypot(py),
            LorentzVector::Cylindrical { pt, .. } => pt,
        }
    }

    pub fn p(&self) -> f64 {
        match *self {
            LorentzVector::Cartesian { px, py, pz, .. } => (px * px + py * py + pz * pz).sqrt(),
            LorentzVector::Cylindrical { pt, eta, .. } => pt * eta.cosh(),
        }
    }

    pub fn energy(&self) -> f64 {
        match self.temporal() {
            Temporal::Energy(energy) => energy,
            Temporal::Mass(mass) => {
                let p = self.p();
                (p * p + mass * mass * mass.signum()).sqrt()
            }
        }
    }

    pub fn mass(&self) -> f64 {
        match self.temporal() {
            Temporal::Mass(mass) => mass,
            Temporal::Energy(energy) => {
                let p = self.p();
                signed_sqrt(energy * energy - p * p)
            }
        }
    }

    pub fn phi(&self) -> f64 {
        match *self {
            LorentzVector::Cartesian { px, py, .. } => py.atan2(px),
            LorentzVector::Cylindrical { phi, .. } => phi,
        }
    }

    pub fn theta(&self) -> f64 {
        match *self {
            LorentzVector::Cartesian { pz, .. } => self.pt().atan2(pz),
            LorentzVector::Cylindrical { eta, .. } => 1f64.atan2(eta.sinh()),
        }
    }

    pub fn eta(&self) -> f64 {
        match *self {
            LorentzVector::Cartesian { .. } => {
                let cos = self.theta().cos();
                -((1.0 - cos) / (1.0 + cos)).ln() / 2.0
            }
            LorentzVector::Cylindrical { eta, .. } => eta,
        }
    }

    /// Transverse energy.
    pub fn et(&self) -> f64 {
        match *self {
            LorentzVector::Cartesian { .. } => self.energy() * self.pt() / self.p(),
            LorentzVector::Cylindrical { eta, .. } => self.energy() / eta.cosh(),
        }
    }

    /// Transverse mass, negative when `E² < pz²`.
    pub fn mt(&self) -> f64 {
        let energy = self.energy();
        let pz = self.pz();
        signed_sqrt(energy * energy - pz * pz)
    }

    pub fn rapidity(&self) -> f64 {
        let energy = self.energy();
        let pz = self.pz();
        ((energy + pz) / (energy - pz)).ln() / 2.0
    }

    pub fn beta(&self) -> f64 {
        self.p() / self.energy()
    }

    /// Lorentz factor; infinite at or beyond the speed of light.
    pub fn gamma(&self) -> f64 {
        let beta = self.beta();
        if -1.0 < beta && beta < 1.0 {
            1.0 / (1.0 - beta * beta).sqrt()
        } else {
            f64::INFINITY
        }
    }

    pub fn member(&self, member: Member) -> f64 {
        match member {
            Member::Px => self.px(),
            Member::Py => self.py(),
            Member::Pz => self.pz(),
            Member::Energy => self.energy(),
            Member::Eta => self.eta(),
            Member::Phi => self.phi(),
            Member::Mass => self.mass(),
            Member::P => self.p(),
            Member::Pt => self.pt(),
            Member::Et => self.et(),
            Member::Mt => self.mt(),
            Member::Theta => self.theta(),
            Member::Rapidity => self.rapidity(),
            Member::Beta => self.beta(),
            Member::Gamma => self.gamma(),
        }
    }

    /// Minkowski product with the (+, -, -, -) metric.
    pub fn dot(&self, other: &LorentzVector) -> f64 {
        self.energy() * other.energy()
            - self.px() * other.px()
            - self.py() * other.py()
            - self.pz() * other.pz()
    }

    /// Azimuthal separation wrapped into `[-pi, pi)`.
    pub fn delta_phi(&self, other: &LorentzVector) -> f64 {
        (self.phi() - other.phi() + PI).rem_euclid(2.0 * PI) - PI
    }

    pub fn delta_r(&self, other: &LorentzVector) -> f64 {
        let dphi = self.delta_phi(other);
        let deta = self.eta() - other.eta();
        (dphi * dphi + deta * deta).sqrt()
    }

    pub fn method(&self, method: LorentzMethod, other: &LorentzVector) -> f64 {
        match method {
            LorentzMethod::Dot => self.dot(other),
            LorentzMethod::DeltaPhi => self.delta_phi(other),
            LorentzMethod::DeltaR => self.delta_r(other),
        }
    }
}
