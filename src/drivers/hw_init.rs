//! One-shot hardware peripheral initialization.
//!
//! Configures the valve/motor-direction GPIO outputs and the motor LEDC
//! timer/channel using raw ESP-IDF sys calls. Called once from `main()`
//! before the control loop starts.  Every output comes up LOW, so all
//! valves are de-energised and the motor is stopped from the first
//! instruction onward.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed { gpio: i32, rc: i32 },
    LedcTimerFailed(i32),
    LedcChannelFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed { gpio, rc } => {
                write!(f, "GPIO{} config failed (rc={})", gpio, rc)
            }
            Self::LedcTimerFailed(rc) => write!(f, "LEDC timer config failed (rc={})", rc),
            Self::LedcChannelFailed(rc) => write!(f, "LEDC channel config failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins::{self, OutputLine};

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_gpio_outputs()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    for line in OutputLine::all() {
        let gpio = line.gpio();
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << gpio,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // Level first: the pin must never glitch high while switching to output.
        unsafe { gpio_set_level(gpio, 0) };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed { gpio, rc: ret });
        }
    }

    info!("hw_init: {} GPIO outputs configured LOW", OutputLine::COUNT);
    Ok(())
}

/// Drive an already-configured output pin.  Returns the raw `esp_err_t`
/// on failure.
#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during init_gpio_outputs(). Main-loop only.
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret == ESP_OK as i32 { Ok(()) } else { Err(ret) }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) -> Result<(), i32> {
    Ok(())
}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // Timer 0: drive motor (8-bit)
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::MOTOR_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer0) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcTimerFailed(ret));
    }

    // Channel 0: motor PWM, starting at duty 0
    let ret = unsafe {
        ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: pins::LEDC_CH_MOTOR,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: pins::MOTOR_PWM_GPIO,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        })
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::LedcChannelFailed(ret));
    }

    info!(
        "hw_init: LEDC configured (motor=CH{} @ {} Hz)",
        pins::LEDC_CH_MOTOR,
        pins::MOTOR_PWM_FREQ_HZ
    );
    Ok(())
}

/// Set and latch an 8-bit duty on a configured LEDC channel.
#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) -> Result<(), i32> {
    // SAFETY: LEDC channels were configured in init_ledc(); duty register
    // writes are race-free since only the main loop calls this function.
    let ret = unsafe { ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty)) };
    if ret != ESP_OK as i32 {
        return Err(ret);
    }
    let ret = unsafe { ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel) };
    if ret == ESP_OK as i32 { Ok(()) } else { Err(ret) }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) -> Result<(), i32> {
    Ok(())
}
