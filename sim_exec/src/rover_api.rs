//! # Rover API
//!
//! The actuator and sensor API of the real rover, implemented on top of a
//! simulation. Control code written against this API can be run against the
//! simulator unchanged.
//!
//! Every actuator call is turned into a command document and applied through
//! the command ingestor, exactly as if it had arrived over the network.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::thread;
use std::time::Duration;
use log::{debug, info};

// Internal
use comms_if::eqpt::rover::{SimCommand, NUM_LEDS, NUM_SERVOS};
use crate::params::SensorParams;
use crate::sim_state::SimHandle;
use crate::telemetry::TelemetryResponder;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Version of the rover board being simulated.
pub const BOARD_VERSION: u8 = 4;

/// Time spent braking before a motor changes direction.
pub const DEFAULT_DIRECTION_CHANGE_DELAY: Duration = Duration::from_millis(200);

/// Default LED brightness.
pub const DEFAULT_BRIGHTNESS: u8 = 40;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A simulated rover.
pub struct Rover {
    sim: SimHandle,
    responder: TelemetryResponder,
    sensors: SensorParams,

    /// Last commanded direction of each side
    left_dir: Direction,
    right_dir: Direction,
    direction_change_delay: Duration,

    /// `None` until the LEDs are initialised with a non-zero brightness
    brightness: Option<u8>,

    /// Colours waiting for `show`, packed as `0xRRGGBB`
    pending_leds: [u32; NUM_LEDS],

    /// Calibration offset added to each servo demand.
    ///
    /// Units: degrees
    offsets: [i8; NUM_SERVOS],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Stopped,
    Forward,
    Reverse,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Rover {
    /// Create a rover driving the given simulation.
    pub fn new(sim: SimHandle, sensors: SensorParams) -> Self {
        Self {
            sim,
            responder: TelemetryResponder::new(&sensors),
            sensors,
            left_dir: Direction::Stopped,
            right_dir: Direction::Stopped,
            direction_change_delay: DEFAULT_DIRECTION_CHANGE_DELAY,
            brightness: None,
            pending_leds: [0; NUM_LEDS],
            offsets: [0; NUM_SERVOS],
        }
    }

    /// Set how long the rover brakes for before reversing a motor.
    pub fn set_direction_change_delay(&mut self, delay: Duration) {
        self.direction_change_delay = delay;
    }

    // ---- GENERAL ----

    /// Initialise the rover, with the LEDs at the given brightness. A
    /// brightness of 0 leaves the LEDs disabled.
    pub fn init(&mut self, brightness: u8) {
        if self.brightness.is_none() && brightness > 0 {
            self.brightness = Some(brightness);
        }

        self.stop();
        if self.brightness.is_some() {
            self.clear();
            self.show();
        }

        info!("Rover initialised (LED brightness {:?})", self.brightness);
    }

    /// Stop the motors and turn off the LEDs.
    pub fn cleanup(&mut self) {
        self.stop();

        if self.brightness.is_some() {
            self.clear();
            self.show();
        }

        info!("Rover cleaned up");
    }

    pub fn version(&self) -> u8 {
        BOARD_VERSION
    }

    // ---- MOTORS ----

    /// Stop both motors, letting the rover coast to a stop.
    pub fn stop(&mut self) {
        self.send(SimCommand::default()
            .with_left_motor(0.0, 0.0)
            .with_right_motor(0.0, 0.0)
        );
        self.left_dir = Direction::Stopped;
        self.right_dir = Direction::Stopped;
    }

    /// Stop both motors using regenerative braking.
    pub fn brake(&mut self) {
        self.send(SimCommand::default()
            .with_left_motor(100.0, 100.0)
            .with_right_motor(100.0, 100.0)
        );
        self.left_dir = Direction::Stopped;
        self.right_dir = Direction::Stopped;
    }

    /// Drive both sides forward at `speed` (0 to 100).
    pub fn forward(&mut self, speed: f64) {
        self.drive(Direction::Forward, speed, Direction::Forward, speed);
    }

    /// Drive both sides in reverse at `speed` (0 to 100).
    pub fn reverse(&mut self, speed: f64) {
        self.drive(Direction::Reverse, speed, Direction::Reverse, speed);
    }

    /// Drive the sides in opposite directions to turn left.
    pub fn spin_left(&mut self, speed: f64) {
        self.drive(Direction::Reverse, speed, Direction::Forward, speed);
    }

    /// Drive the sides in opposite directions to turn right.
    pub fn spin_right(&mut self, speed: f64) {
        self.drive(Direction::Forward, speed, Direction::Reverse, speed);
    }

    /// Move forward in an arc with different speeds on each side.
    pub fn turn_forward(&mut self, left_speed: f64, right_speed: f64) {
        self.drive(
            Direction::Forward, left_speed,
            Direction::Forward, right_speed,
        );
    }

    /// Move in reverse in an arc with different speeds on each side.
    pub fn turn_reverse(&mut self, left_speed: f64, right_speed: f64) {
        self.drive(
            Direction::Reverse, left_speed,
            Direction::Reverse, right_speed,
        );
    }

    // ---- SENSORS ----

    /// State of the left IR obstacle sensor
    pub fn ir_left(&self) -> bool {
        self.sensors.ir_obstacle[0]
    }

    /// State of the right IR obstacle sensor
    pub fn ir_right(&self) -> bool {
        self.sensors.ir_obstacle[1]
    }

    /// True if either IR obstacle sensor is triggered
    pub fn ir_all(&self) -> bool {
        self.ir_left() || self.ir_right()
    }

    pub fn ir_left_line(&self) -> bool {
        self.sensors.ir_line[0]
    }

    pub fn ir_right_line(&self) -> bool {
        self.sensors.ir_line[1]
    }

    /// Reading from light sensor `sensor` (0 to 3, front left, front right,
    /// back left, back right), from 0 to 1023. `None` if there is no such
    /// sensor.
    pub fn get_light(&self, sensor: usize) -> Option<u16> {
        self.sensors.light.get(sensor).copied()
    }

    pub fn get_light_fl(&self) -> u16 {
        self.sensors.light[0]
    }

    pub fn get_light_fr(&self) -> u16 {
        self.sensors.light[1]
    }

    pub fn get_light_bl(&self) -> u16 {
        self.sensors.light[2]
    }

    pub fn get_light_br(&self) -> u16 {
        self.sensors.light[3]
    }

    /// Voltage of the battery pack, anything above 7.2 V is healthy.
    pub fn get_battery(&self) -> f64 {
        self.sensors.battery_v
    }

    /// True while the tact switch is pressed
    pub fn get_switch(&self) -> bool {
        self.sensors.switch_pressed
    }

    /// Distance to the nearest object in front of the rover.
    ///
    /// Units: centimeters
    pub fn get_distance(&self) -> f64 {
        self.responder.respond().ultrasonic_range
    }

    // ---- LEDS ----

    /// Set every LED to `color`. Takes effect on `show`.
    pub fn set_color(&mut self, color: u32) {
        for id in 0..NUM_LEDS {
            self.set_pixel(id, color);
        }
    }

    /// Set one LED to `color`. Takes effect on `show`.
    pub fn set_pixel(&mut self, id: usize, color: u32) {
        if self.brightness.is_none() {
            return;
        }

        match self.pending_leds.get_mut(id) {
            Some(led) => *led = color,
            None => debug!("Ignoring colour for LED {}", id),
        }
    }

    /// Send the pending colours to the LEDs.
    pub fn show(&mut self) {
        if self.brightness.is_none() {
            return;
        }

        let cmd = self.pending_leds.iter()
            .enumerate()
            .fold(SimCommand::default(), |cmd, (id, color)| {
                let (r, g, b) = to_rgb(*color);
                cmd.with_led(id, [r, g, b])
            });

        self.send(cmd);
    }

    /// Turn every LED off. Takes effect on `show`.
    pub fn clear(&mut self) {
        self.set_color(0);
    }

    /// Spread the colour wheel across the LEDs. Takes effect on `show`.
    pub fn rainbow(&mut self) {
        for id in 0..NUM_LEDS {
            let pos = id * 256 / NUM_LEDS;
            self.set_pixel(id, wheel(pos as u8));
        }
    }

    // ---- SERVOS ----

    /// Move a servo to `degrees`, corrected by the channel's offset.
    pub fn set_servo(&mut self, servo: usize, degrees: f64) {
        let offset = match self.offsets.get(servo) {
            Some(o) => *o as f64,
            None => {
                debug!("Ignoring demand for servo {}", servo);
                return;
            }
        };

        self.send(SimCommand::default().with_servo(servo, degrees + offset));
    }

    /// Stop driving every servo.
    ///
    /// An unpowered servo stays where it was, so the simulated angles are
    /// left as they are until the next `set_servo`.
    pub fn stop_servos(&mut self) {
        debug!("Servos released");
    }

    /// Set the calibration offset of a servo channel.
    pub fn set_offset(&mut self, servo: usize, offset_deg: i8) {
        if let Some(o) = self.offsets.get_mut(servo) {
            *o = offset_deg;
        }
    }

    pub fn offsets(&self) -> &[i8; NUM_SERVOS] {
        &self.offsets
    }

    // ---- PRIVATE ----

    /// Drive each side in the given direction, braking first if either side
    /// is reversing.
    fn drive(
        &mut self,
        left_dir: Direction,
        left_speed: f64,
        right_dir: Direction,
        right_speed: f64,
    ) {
        if self.left_dir.opposes(left_dir)
            || self.right_dir.opposes(right_dir)
        {
            self.brake();
            thread::sleep(self.direction_change_delay);
        }

        let (lf, lr) = left_dir.duties(left_speed);
        let (rf, rr) = right_dir.duties(right_speed);
        self.send(SimCommand::default()
            .with_left_motor(lf, lr)
            .with_right_motor(rf, rr)
        );

        self.left_dir = left_dir;
        self.right_dir = right_dir;
    }

    fn send(&self, cmd: SimCommand) {
        self.sim.apply_command(&cmd);
    }
}

impl Direction {
    fn opposes(&self, other: Direction) -> bool {
        matches!(
            (self, other),
            (Direction::Forward, Direction::Reverse)
                | (Direction::Reverse, Direction::Forward)
        )
    }

    /// `[forward, reverse]` duties for driving at `speed` in this direction.
    fn duties(&self, speed: f64) -> (f64, f64) {
        let speed = util::maths::clamp(&speed, &0.0, &100.0);

        match self {
            Direction::Forward => (speed, 0.0),
            Direction::Reverse => (0.0, speed),
            Direction::Stopped => (0.0, 0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Pack a colour as `0xRRGGBB`.
pub fn from_rgb(red: u8, green: u8, blue: u8) -> u32 {
    ((red as u32) << 16) | ((green as u32) << 8) | blue as u32
}

/// Unpack a `0xRRGGBB` colour.
pub fn to_rgb(color: u32) -> (u8, u8, u8) {
    (
        ((color >> 16) & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        (color & 0xff) as u8,
    )
}

/// Colour at position `pos` around a red, green, blue colour wheel.
pub fn wheel(pos: u8) -> u32 {
    match pos {
        0..=84 => from_rgb(255 - pos * 3, pos * 3, 0),
        85..=169 => {
            let pos = pos - 85;
            from_rgb(0, 255 - pos * 3, pos * 3)
        }
        _ => {
            let pos = pos - 170;
            from_rgb(pos * 3, 0, 255 - pos * 3)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::actuators::Rgb;

    fn rover() -> (Rover, SimHandle) {
        let sim = SimHandle::new();
        let mut rover = Rover::new(sim.clone(), SensorParams::default());
        rover.set_direction_change_delay(Duration::from_millis(0));
        (rover, sim)
    }

    #[test]
    fn test_motors() {
        let (mut rover, sim) = rover();

        rover.forward(60.0);
        assert_eq!(sim.actuators().drive.speed_left, 60);
        assert_eq!(sim.actuators().drive.speed_right, 60);

        rover.spin_left(30.0);
        assert_eq!(sim.actuators().drive.speed_left, -30);
        assert_eq!(sim.actuators().drive.speed_right, 30);

        rover.turn_reverse(20.0, 250.0);
        assert_eq!(sim.actuators().drive.speed_left, -20);
        assert_eq!(sim.actuators().drive.speed_right, -100);

        rover.brake();
        assert_eq!(sim.actuators().drive.speed_left, 0);
        assert_eq!(sim.actuators().drive.speed_right, 0);
    }

    #[test]
    fn test_direction_change_brakes() {
        let (mut rover, _) = rover();

        rover.forward(50.0);
        assert!(rover.left_dir.opposes(Direction::Reverse));

        rover.spin_right(50.0);
        assert_eq!(rover.left_dir, Direction::Forward);
        assert_eq!(rover.right_dir, Direction::Reverse);

        rover.stop();
        assert!(!rover.right_dir.opposes(Direction::Forward));
    }

    #[test]
    fn test_servo_offsets() {
        let (mut rover, sim) = rover();

        rover.set_offset(9, -3);
        rover.set_servo(9, 20.0);
        rover.set_servo(16, 20.0);

        assert_eq!(sim.actuators().servos_deg[9], 17.0);
        assert_eq!(rover.offsets()[9], -3);
    }

    #[test]
    fn test_leds_need_init() {
        let (mut rover, sim) = rover();

        rover.set_color(from_rgb(255, 0, 0));
        rover.show();
        assert_eq!(sim.actuators().leds[0], Rgb(0, 0, 0));

        rover.init(DEFAULT_BRIGHTNESS);
        rover.set_pixel(1, from_rgb(0, 10, 20));
        rover.set_pixel(7, from_rgb(1, 1, 1));
        assert_eq!(sim.actuators().leds[1], Rgb(0, 0, 0));

        rover.show();
        assert_eq!(sim.actuators().leds[1], Rgb(0, 10, 20));

        rover.cleanup();
        assert_eq!(sim.actuators().leds[1], Rgb(0, 0, 0));
    }

    #[test]
    fn test_rainbow() {
        let (mut rover, sim) = rover();
        rover.init(DEFAULT_BRIGHTNESS);

        rover.rainbow();
        rover.show();

        let leds = sim.actuators().leds;
        assert_eq!(leds[0], Rgb(255, 0, 0));
        assert_eq!(leds[1], Rgb(63, 192, 0));
    }

    #[test]
    fn test_colour_helpers() {
        assert_eq!(from_rgb(0x12, 0x34, 0x56), 0x123456);
        assert_eq!(to_rgb(0x123456), (0x12, 0x34, 0x56));
        assert_eq!(wheel(0), 0xff0000);
        assert_eq!(wheel(85), 0x00ff00);
        assert_eq!(wheel(170), 0x0000ff);
        assert_eq!(to_rgb(wheel(255)), (255, 0, 0));
    }

    #[test]
    fn test_sensors() {
        let sensors = SensorParams {
            ultrasonic_range_cm: 42.0,
            ir_obstacle: [false, true],
            ir_line: [true, false],
            light: [10, 20, 30, 1023],
            battery_v: 6.9,
            switch_pressed: true,
        };
        let rover = Rover::new(SimHandle::new(), sensors);

        assert_eq!(rover.get_distance(), 42.0);
        assert!(!rover.ir_left() && rover.ir_right() && rover.ir_all());
        assert!(rover.ir_left_line() && !rover.ir_right_line());
        assert_eq!(rover.version(), 4);

        assert_eq!(rover.get_light(1), Some(20));
        assert_eq!(rover.get_light(4), None);
        assert_eq!(
            [
                rover.get_light_fl(),
                rover.get_light_fr(),
                rover.get_light_bl(),
                rover.get_light_br(),
            ],
            [10, 20, 30, 1023]
        );
        assert_eq!(rover.get_battery(), 6.9);
        assert!(rover.get_switch());
    }

    #[test]
    fn test_stop_servos_holds_angles() {
        let (mut rover, sim) = rover();

        rover.set_servo(0, 35.0);
        rover.set_servo(13, -12.0);
        let before = sim.actuators();

        rover.stop_servos();
        assert_eq!(sim.actuators(), before);

        rover.set_servo(0, 5.0);
        assert_eq!(sim.actuators().servos_deg[0], 5.0);
    }
}
