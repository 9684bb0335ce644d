//! Physical constants passed explicitly into the tracking context.

/// Physical constants used by the equation of motion and energy laws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicalConstants {
    /// Speed of light in vacuum [m/s].
    pub speed_of_light: f64,
    /// Elementary charge [C]; converts between J and eV.
    pub elementary_charge: f64,
    /// Gravitational acceleration along -z [m/s²].
    pub gravity: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            speed_of_light: 299_792_458.0,
            elementary_charge: 1.602_176_634e-19,
            gravity: 9.806_65,
        }
    }
}

impl PhysicalConstants {
    /// Constants with gravity switched off.
    pub fn without_gravity() -> Self {
        Self {
            gravity: 0.0,
            ..Self::default()
        }
    }
}
