#![no_std]
#![no_main]

/// modules
use pantilt::err::log::{err_cfg_h, err_pwm_h, log_err};
use pantilt::pwm::{actuator::PanTilt, servo::Servo};

/// configuration
use defmt_rtt as _;
use panic_probe as _;

/// system
use rtic_monotonics::systick_monotonic;
use rtic_monotonics::Monotonic;
systick_monotonic!(Mono, 1000);

/// motion
use pantilt_common::{MotionConfig, PinSignal, Puppet, RngSource, Scheduler};
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// hal
use pwm_pca9685::{Channel, Pca9685};
use stm32f4xx_hal::prelude::*;
use stm32f4xx_hal::{gpio, i2c::I2c1, pac, timer};

/// type
type StatusLed = PinSignal<gpio::Pin<'B', 10, gpio::Output>>;

type Prop = Scheduler<
    PanTilt<I2c1>,
    timer::Delay<pac::TIM2, 1000>,
    RngSource<SmallRng>,
    StatusLed,
>;

const PCA_9685_ADDR: u8 = 0x41;
// 25 MHz / (4096 * 50 Hz) - 1
const PCA_9685_PRESCALE_50HZ: u8 = 121;
const RETRY_PAUSE_MS: u32 = 1_000;

#[rtic::app(device = stm32f4xx_hal::pac, peripherals = true)]
mod app {

    use super::*;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        prop: Prop,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        let dp = cx.device;
        let rcc = dp.RCC.constrain();
        let hse = 12.MHz();
        let sysclk = 64.MHz();
        let clocks = rcc.cfgr.use_hse(hse).sysclk(sysclk).freeze();

        Mono::start(cx.core.SYST, sysclk.to_Hz());

        let gpiob = dp.GPIOB.split();
        let gpioc = dp.GPIOC.split();

        // servo rail enable, active low
        let mut servo_en = gpioc.pc3.into_push_pull_output();
        servo_en.set_low();

        // PCA9685 on I2C1
        let i2c1_scl = gpiob.pb8.into_alternate_open_drain();
        let i2c1_sda = gpiob.pb9.into_alternate_open_drain();
        let i2c1 = I2c1::new(dp.I2C1, (i2c1_scl, i2c1_sda), 400.kHz(), &clocks);

        let mut pwm = Pca9685::new(i2c1, PCA_9685_ADDR).unwrap();
        pwm.enable().unwrap();
        pwm.set_prescale(PCA_9685_PRESCALE_50HZ).unwrap();

        let config = MotionConfig::default();
        let home = (config.horizontal.center(), config.vertical.center());
        let servos = match PanTilt::attach(pwm, Servo::default(), Channel::C1, Channel::C2, home) {
            Ok(servos) => servos,
            Err(e) => {
                log_err(err_pwm_h(e));
                panic!("servo attach failed");
            }
        };
        defmt::info!("servos attached at {}, {}", home.0, home.1);

        // busy light
        let led = PinSignal::new(gpiob.pb10.into_push_pull_output());

        let delay = dp.TIM2.delay_ms(&clocks);

        // whatever the counters read by now is all the entropy there is
        let seed = (Mono::now().ticks() as u64) << 32 | cortex_m::peripheral::SYST::get_current() as u64;
        let rng = RngSource(SmallRng::seed_from_u64(seed));

        let puppet = match Puppet::new(servos, delay, rng, led, config) {
            Ok(puppet) => puppet,
            Err(e) => {
                log_err(err_cfg_h(e));
                panic!("invalid motion config");
            }
        };

        (
            Shared {},
            Local {
                prop: Scheduler::new(puppet),
            },
        )
    }

    // The motion loop blocks on the timer for its whole life, so it runs as
    // the idle task.
    #[idle(local = [prop])]
    fn idle(cx: idle::Context) -> ! {
        let prop = cx.local.prop;
        loop {
            match prop.run() {
                Ok(never) => match never {},
                Err(e) => {
                    log_err(err_pwm_h(e));
                    prop.puppet_mut().pause(RETRY_PAUSE_MS);
                    defmt::warn!("restarting after {} behaviors", prop.ticks());
                }
            }
        }
    }
}
