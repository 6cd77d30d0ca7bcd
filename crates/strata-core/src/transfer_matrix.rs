use num_complex::Complex64;

/// A 2×2 complex transfer matrix of a fluid-like layer.
///
/// Relates the pressure and normal velocity on the front face to those on
/// the back face:
///
/// ```text
/// [p_front ]   [a  b] [p_back ]
/// [v3_front] = [c  d] [v3_back]
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TransferMatrix {
    pub a: Complex64,
    pub b: Complex64,
    pub c: Complex64,
    pub d: Complex64,
}

impl TransferMatrix {
    /// Identity matrix (layer of zero thickness).
    pub fn identity() -> Self {
        Self {
            a: Complex64::new(1.0, 0.0),
            b: Complex64::new(0.0, 0.0),
            c: Complex64::new(0.0, 0.0),
            d: Complex64::new(1.0, 0.0),
        }
    }

    /// Layer of thickness `h` with normal wavenumber `k3` and wave
    /// admittance `admittance` = k3/(ωρ).
    pub fn layer(k3: Complex64, admittance: Complex64, h: f64) -> Self {
        let j = Complex64::new(0.0, 1.0);
        let (cos, sin) = ((k3 * h).cos(), (k3 * h).sin());
        Self {
            a: cos,
            b: j * sin / admittance,
            c: j * admittance * sin,
            d: cos,
        }
    }

    /// Chain (multiply) this matrix with another: self · other.
    pub fn chain(&self, other: &TransferMatrix) -> TransferMatrix {
        TransferMatrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
        }
    }

    /// Surface admittance v3/p on the front face when the back face sees
    /// the admittance `back` (zero for a rigid wall).
    pub fn surface_admittance(&self, back: Complex64) -> Complex64 {
        (self.c + self.d * back) / (self.a + self.b * back)
    }

    /// Reflection coefficient for a plane wave arriving from a fluid with
    /// admittance `incident`, and the transmitted amplitude into a
    /// semi-infinite fluid of admittance `transmitted` if there is one.
    ///
    /// R = (Y0 − Ys)/(Y0 + Ys)
    pub fn terminate(&self, incident: Complex64, transmitted: Option<Complex64>) -> (Complex64, Option<Complex64>) {
        let back = transmitted.unwrap_or_default();
        let ys = self.surface_admittance(back);
        let r = (incident - ys) / (incident + ys);
        let t = transmitted.map(|yt| (1.0 + r) / (self.a + self.b * yt));
        (r, t)
    }
}
