/*
 * Test utilities for smcfan
 *
 * A throwaway applesmc sysfs tree and a sleeper that plays a script, so the
 * control loop can be driven end to end against real files.
 */

#[cfg(test)]
pub mod test_utils {
    use crate::actuators::{ActuatorId, FanSpec};
    use crate::config::Calibration;
    use crate::controller::{SleepOutcome, Sleeper};
    use crate::error::Result;
    use crate::sensors::SensorId;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    /// applesmc directory with `tempN_input`, `fanN_min` and `fanN_manual`
    pub struct FakeSmc {
        pub dir: TempDir,
    }

    impl FakeSmc {
        pub fn new(sensors: &[u32], fans: &[u32]) -> Self {
            let dir = TempDir::new().unwrap();
            for s in sensors {
                fs::write(dir.path().join(format!("temp{}_input", s)), "40000\n").unwrap();
            }
            for f in fans {
                fs::write(dir.path().join(format!("fan{}_min", f)), "0\n").unwrap();
                fs::write(dir.path().join(format!("fan{}_output", f)), "0\n").unwrap();
                fs::write(dir.path().join(format!("fan{}_manual", f)), "0\n").unwrap();
            }
            Self { dir }
        }

        pub fn path(&self) -> PathBuf {
            self.dir.path().to_path_buf()
        }

        pub fn set_temp(&self, sensor: u32, degrees: i32) {
            self.set_raw(sensor, &format!("{}\n", degrees * 1000));
        }

        pub fn set_raw(&self, sensor: u32, content: &str) {
            fs::write(self.dir.path().join(format!("temp{}_input", sensor)), content).unwrap();
        }

        pub fn remove_sensor(&self, sensor: u32) {
            fs::remove_file(self.dir.path().join(format!("temp{}_input", sensor))).unwrap();
        }

        pub fn remove_fan(&self, fan: u32) {
            let _ = fs::remove_file(self.dir.path().join(format!("fan{}_min", fan)));
            let _ = fs::remove_file(self.dir.path().join(format!("fan{}_output", fan)));
            let _ = fs::remove_file(self.dir.path().join(format!("fan{}_manual", fan)));
        }

        pub fn min_speed(&self, fan: u32) -> String {
            fs::read_to_string(self.dir.path().join(format!("fan{}_min", fan))).unwrap()
        }

        pub fn output(&self, fan: u32) -> String {
            fs::read_to_string(self.dir.path().join(format!("fan{}_output", fan))).unwrap()
        }

        pub fn manual(&self, fan: u32) -> String {
            fs::read_to_string(self.dir.path().join(format!("fan{}_manual", fan))).unwrap()
        }

        /// Reference calibration pointed at this tree, without pacing
        pub fn calibration(&self, sensors: &[u32], fans: &[u32]) -> Calibration {
            Calibration {
                smc_dir: self.path(),
                sensor_dir: self.path(),
                sensors: sensors.iter().copied().map(SensorId).collect(),
                fans: fans.iter().map(|&f| FanSpec::new(f, 1000, 2200)).collect(),
                write_delay_ms: 0,
                poll_interval_ms: 1,
                pid_file: self.dir.path().join("smcfancontrol.pid"),
                ..Calibration::default()
            }
        }
    }

    /// Runs one step per sleep, then asks the loop to stop
    #[derive(Default)]
    pub struct ScriptedSleeper<'a> {
        steps: VecDeque<Box<dyn FnMut() + 'a>>,
        pub sleeps: usize,
    }

    impl<'a> ScriptedSleeper<'a> {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn then(mut self, step: impl FnMut() + 'a) -> Self {
            self.steps.push_back(Box::new(step));
            self
        }
    }

    impl Sleeper for ScriptedSleeper<'_> {
        fn sleep(&mut self, _interval: Duration) -> Result<SleepOutcome> {
            self.sleeps += 1;
            match self.steps.pop_front() {
                Some(mut step) => {
                    step();
                    Ok(SleepOutcome::Elapsed)
                }
                None => Ok(SleepOutcome::Terminate),
            }
        }
    }

    pub fn fan(id: u32) -> ActuatorId {
        ActuatorId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use crate::actuators::SysfsFans;
    use crate::controller::{Controller, ExitReason};
    use crate::error::SmcFanError;
    use crate::sensors::SysfsSensors;
    use crate::supervisor::RecordingSupervisor;

    fn controller(smc: &FakeSmc, sensors: &[u32], fans: &[u32]) -> Controller<SysfsSensors, SysfsFans, RecordingSupervisor> {
        let cal = smc.calibration(sensors, fans);
        Controller::new(
            &cal,
            SysfsSensors::new(smc.path()),
            SysfsFans::new(smc.path()),
            RecordingSupervisor::default(),
        )
    }

    #[test]
    fn test_fake_smc_layout() {
        let smc = FakeSmc::new(&[22], &[1, 2]);
        smc.set_temp(22, 75);
        assert_eq!(
            std::fs::read_to_string(smc.path().join("temp22_input")).unwrap(),
            "75000\n"
        );
        assert_eq!(smc.manual(2), "0\n");
        assert_eq!(fan(3).to_string(), "fan3");
    }

    #[test]
    fn test_scripted_sleeper_terminates_when_exhausted() {
        use crate::controller::{SleepOutcome, Sleeper};
        use std::time::Duration;
        let mut sleeper = ScriptedSleeper::new().then(|| {});
        assert_eq!(sleeper.sleep(Duration::ZERO).unwrap(), SleepOutcome::Elapsed);
        assert_eq!(sleeper.sleep(Duration::ZERO).unwrap(), SleepOutcome::Terminate);
        assert_eq!(sleeper.sleeps, 2);
    }

    #[test]
    fn test_loop_against_sysfs_files() {
        let smc = FakeSmc::new(&[22], &[1, 2]);
        smc.set_temp(22, 70);
        let mut sleeper = ScriptedSleeper::new()
            .then(|| smc.set_temp(22, 72))
            .then(|| {
                // first rise after startup fires at once: step 4
                assert_eq!(smc.min_speed(1), "1240");
                assert_eq!(smc.output(1), "1240");
                assert_eq!(smc.manual(1), "1");
                smc.set_temp(22, 73);
            })
            .then(|| smc.set_temp(22, 74));

        let reason = controller(&smc, &[22], &[1, 2]).run(&mut sleeper);
        assert!(matches!(reason, ExitReason::Terminated));
        assert_eq!(smc.min_speed(2), "1480");
        assert_eq!(smc.output(2), "1480");
        assert_eq!(smc.manual(1), "0");
        assert_eq!(smc.manual(2), "0");
    }

    #[test]
    fn test_removed_fan_is_skipped() {
        let smc = FakeSmc::new(&[22], &[1, 2]);
        smc.remove_fan(1);
        smc.set_temp(22, 80);
        let reason = controller(&smc, &[22], &[1, 2]).run(&mut ScriptedSleeper::new());
        assert!(reason.is_success());
        assert_eq!(smc.output(2), "2200");
        assert!(!smc.path().join("fan1_output").exists());
    }

    #[test]
    fn test_vanished_sensor_ends_loop_with_fans_released() {
        let smc = FakeSmc::new(&[22], &[1]);
        let mut sleeper = ScriptedSleeper::new().then(|| smc.remove_sensor(22));
        let reason = controller(&smc, &[22], &[1]).run(&mut sleeper);
        assert!(matches!(reason, ExitReason::Fatal(SmcFanError::SensorRead { .. })));
        assert_eq!(smc.manual(1), "0");
    }
}
