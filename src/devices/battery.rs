use crate::sim::types::BatterySpec;

/// A stationary battery holding its state of charge for one simulation run.
///
/// `Battery` enforces the power rating, the SOC window and the conversion
/// losses whenever energy is moved in or out. All quantities are per one-hour
/// step, so kW and kWh are interchangeable in the arguments and return values.
///
/// A battery with zero capacity or zero power never moves any energy.
#[derive(Debug, Clone)]
pub struct Battery {
    /// Usable nameplate capacity in kilowatt-hours.
    pub capacity_kwh: f64,

    /// Charge and discharge power limit in kilowatts.
    pub power_kw: f64,

    /// Charging efficiency (0..1.0).
    pub eta_c: f64,

    /// Discharging efficiency (0..1.0).
    pub eta_d: f64,

    soc_kwh: f64,
    min_soc_kwh: f64,
    max_soc_kwh: f64,
}

impl Battery {
    /// Creates a battery from a validated spec.
    ///
    /// The round-trip efficiency is split evenly between charging and
    /// discharging (`eta_c = eta_d = sqrt(rte)`). The initial SOC is clamped
    /// into the configured window.
    pub fn new(spec: &BatterySpec) -> Self {
        let capacity_kwh = spec.capacity_kwh.max(0.0);
        let eta = spec.round_trip_efficiency.sqrt();
        let min_soc_kwh = spec.min_soc * capacity_kwh;
        let max_soc_kwh = spec.max_soc * capacity_kwh;
        Self {
            capacity_kwh,
            power_kw: spec.effective_power_kw(),
            eta_c: eta,
            eta_d: eta,
            soc_kwh: (spec.initial_soc * capacity_kwh).clamp(min_soc_kwh, max_soc_kwh),
            min_soc_kwh,
            max_soc_kwh,
        }
    }

    /// Stored energy in kWh.
    pub fn soc_kwh(&self) -> f64 {
        self.soc_kwh
    }

    /// Lower and upper SOC bounds in kWh.
    pub fn soc_window_kwh(&self) -> (f64, f64) {
        (self.min_soc_kwh, self.max_soc_kwh)
    }

    fn is_active(&self) -> bool {
        self.capacity_kwh > 0.0 && self.power_kw > 0.0
    }

    /// Absorbs up to `offered_kw` of surplus for one hour.
    ///
    /// # Returns
    ///
    /// Energy taken from the offered surplus (before charging losses).
    pub fn charge(&mut self, offered_kw: f64) -> f64 {
        if !self.is_active() || offered_kw <= 0.0 {
            return 0.0;
        }
        let headroom = (self.max_soc_kwh - self.soc_kwh) / self.eta_c;
        let taken = offered_kw.min(self.power_kw).min(headroom).max(0.0);

        self.soc_kwh += taken * self.eta_c;
        self.soc_kwh = self.soc_kwh.clamp(self.min_soc_kwh, self.max_soc_kwh);
        taken
    }

    /// Delivers up to `requested_kw` for one hour.
    ///
    /// # Returns
    ///
    /// Energy delivered to the load (after discharging losses).
    pub fn discharge(&mut self, requested_kw: f64) -> f64 {
        if !self.is_active() || requested_kw <= 0.0 {
            return 0.0;
        }
        let available = (self.soc_kwh - self.min_soc_kwh) * self.eta_d;
        let delivered = requested_kw.min(self.power_kw).min(available).max(0.0);

        self.soc_kwh -= delivered / self.eta_d;
        self.soc_kwh = self.soc_kwh.clamp(self.min_soc_kwh, self.max_soc_kwh);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(capacity_kwh: f64, power_kw: f64, rte: f64) -> BatterySpec {
        BatterySpec {
            capacity_kwh,
            power_kw: Some(power_kw),
            round_trip_efficiency: rte,
            ..BatterySpec::default()
        }
    }

    #[test]
    fn test_new_battery() {
        let battery = Battery::new(&spec(10.0, 5.0, 0.81));
        assert_eq!(battery.capacity_kwh, 10.0);
        assert_eq!(battery.power_kw, 5.0);
        assert!((battery.eta_c - 0.9).abs() < 1e-12);
        assert!((battery.eta_d - 0.9).abs() < 1e-12);
        assert!((battery.soc_kwh() - 5.0).abs() < 1e-12);
        assert_eq!(battery.soc_window_kwh(), (1.0, 9.0));
    }

    #[test]
    fn test_default_power_is_half_capacity() {
        let s = BatterySpec {
            capacity_kwh: 20.0,
            power_kw: None,
            ..BatterySpec::default()
        };
        assert_eq!(Battery::new(&s).power_kw, 10.0);
    }

    #[test]
    fn test_charge_power_limit() {
        let mut battery = Battery::new(&spec(10.0, 2.0, 1.0));
        assert_eq!(battery.charge(10.0), 2.0);
    }

    #[test]
    fn test_discharge_power_limit() {
        let mut battery = Battery::new(&spec(10.0, 2.0, 1.0));
        assert_eq!(battery.discharge(10.0), 2.0);
    }

    #[test]
    fn test_charge_soc_limit() {
        // 50% of 10 kWh, max 90%: 4 kWh of headroom.
        let mut battery = Battery::new(&spec(10.0, 10.0, 1.0));
        let taken = battery.charge(10.0);
        assert!((taken - 4.0).abs() < 1e-9);
        assert!((battery.soc_kwh() - 9.0).abs() < 1e-9);
        assert_eq!(battery.charge(1.0), 0.0);
    }

    #[test]
    fn test_discharge_soc_limit() {
        // 50% of 10 kWh, min 10%: 4 kWh available.
        let mut battery = Battery::new(&spec(10.0, 10.0, 1.0));
        let delivered = battery.discharge(10.0);
        assert!((delivered - 4.0).abs() < 1e-9);
        assert!((battery.soc_kwh() - 1.0).abs() < 1e-9);
        assert_eq!(battery.discharge(1.0), 0.0);
    }

    #[test]
    fn test_efficiency_charge() {
        // eta_c = 0.9: 2 kWh in stores 1.8 kWh.
        let mut battery = Battery::new(&spec(10.0, 5.0, 0.81));
        battery.charge(2.0);
        assert!((battery.soc_kwh() - 6.8).abs() < 1e-9);
    }

    #[test]
    fn test_efficiency_discharge() {
        // eta_d = 0.9: 1.8 kWh out drains 2 kWh.
        let mut battery = Battery::new(&spec(10.0, 5.0, 0.81));
        battery.discharge(1.8);
        assert!((battery.soc_kwh() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_capacity_is_inert() {
        let mut battery = Battery::new(&spec(0.0, 5.0, 0.9));
        assert_eq!(battery.charge(3.0), 0.0);
        assert_eq!(battery.discharge(3.0), 0.0);
        assert_eq!(battery.soc_kwh(), 0.0);
    }

    #[test]
    fn test_zero_power_is_inert() {
        let mut battery = Battery::new(&spec(10.0, 0.0, 0.9));
        assert_eq!(battery.charge(3.0), 0.0);
        assert_eq!(battery.discharge(3.0), 0.0);
    }

    #[test]
    fn test_complete_charge_discharge_cycle() {
        let mut battery = Battery::new(&spec(10.0, 2.0, 0.81));
        for _ in 0..10 {
            battery.charge(2.0);
        }
        let (min, max) = battery.soc_window_kwh();
        assert!((battery.soc_kwh() - max).abs() < 1e-9);

        let mut delivered = 0.0;
        for _ in 0..10 {
            delivered += battery.discharge(2.0);
        }
        assert!((battery.soc_kwh() - min).abs() < 1e-9);
        // 8 kWh window at 90% discharge efficiency.
        assert!((delivered - 7.2).abs() < 1e-9);
    }
}
