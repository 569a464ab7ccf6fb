// ts-core/src/units.rs

use uom::si::f64::{
    ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime, Volume as UomVolume,
};

// Public canonical unit types (SI, f64)
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;
pub type Volume = UomVolume;

#[inline]
pub fn liters(v: f64) -> Volume {
    use uom::si::volume::liter;
    Volume::new::<liter>(v)
}

#[inline]
pub fn ml(v: f64) -> Volume {
    use uom::si::volume::milliliter;
    Volume::new::<milliliter>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn millis(v: f64) -> Time {
    use uom::si::time::millisecond;
    Time::new::<millisecond>(v)
}

/// Scalar readouts in the units the engine stores internally.
#[inline]
pub fn in_liters(v: Volume) -> f64 {
    v.get::<uom::si::volume::liter>()
}

#[inline]
pub fn in_ml(v: Volume) -> f64 {
    v.get::<uom::si::volume::milliliter>()
}

#[inline]
pub fn in_seconds(t: Time) -> f64 {
    t.get::<uom::si::time::second>()
}

#[inline]
pub fn in_celsius(t: Temperature) -> f64 {
    t.get::<uom::si::thermodynamic_temperature::degree_celsius>()
}

pub mod constants {
    /// Standard laboratory temperature.
    pub const ROOM_TEMPERATURE_K: f64 = 298.15;

    /// Hydronium concentration of pure water at 25 °C (mol/L).
    pub const WATER_SELF_IONIZATION_M: f64 = 1e-7;

    pub const PH_MIN: f64 = 0.0;
    pub const PH_NEUTRAL: f64 = 7.0;
    pub const PH_MAX: f64 = 14.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ml_converts_to_liters() {
        assert!((in_liters(ml(25.0)) - 0.025).abs() < 1e-15);
        assert!((in_ml(liters(0.1)) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn millis_converts_to_seconds() {
        assert!((in_seconds(millis(50.0)) - 0.05).abs() < 1e-15);
        assert!((in_seconds(millis(1500.0)) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn room_temperature_in_celsius() {
        assert!((in_celsius(k(constants::ROOM_TEMPERATURE_K)) - 25.0).abs() < 1e-9);
    }
}
