//! Sampling timer.
//!
//! On the device this is a GPTimer counting up from the APB clock at
//! 80 MHz / 1024.  When the counter reaches the compare value the alarm
//! ISR sets the [`TickFlag`] and the counter auto-reloads to zero.
//!
//! On host targets [`SimTimer`] models the same register behaviour so the
//! controller's timer handling can be tested without hardware.

use crate::app::ports::TickTimer;
use crate::error::TimerError;

#[cfg(target_os = "espidf")]
use crate::config::TIMER_TICK_HZ;
#[cfg(target_os = "espidf")]
use crate::events::TickFlag;
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

// ---------------------------------------------------------------------------
// ESP32 GPTimer
// ---------------------------------------------------------------------------

/// Alarm ISR.  `user_ctx` is the `&'static TickFlag` registered in
/// [`GpTimer::new`].
#[cfg(target_os = "espidf")]
unsafe extern "C" fn sample_alarm_isr(
    _timer: gptimer_handle_t,
    _edata: *const gptimer_alarm_event_data_t,
    user_ctx: *mut core::ffi::c_void,
) -> bool {
    // SAFETY: user_ctx was created from a `&'static TickFlag`.
    let flag = unsafe { &*(user_ctx as *const TickFlag) };
    flag.on_interrupt();
    false // no higher-priority task woken
}

#[cfg(target_os = "espidf")]
fn check(rc: esp_err_t) -> Result<(), TimerError> {
    if rc == ESP_OK as i32 {
        Ok(())
    } else {
        Err(TimerError::Driver(rc))
    }
}

/// GPTimer-backed sampling timer.
#[cfg(target_os = "espidf")]
pub struct GpTimer {
    handle: gptimer_handle_t,
    configured: bool,
    running: bool,
}

#[cfg(target_os = "espidf")]
impl GpTimer {
    /// Create the timer, hook the alarm ISR to `tick` and enable it.
    /// The timer does not count until [`TickTimer::start`].
    pub fn new(tick: &'static TickFlag) -> Result<Self, TimerError> {
        let mut handle: gptimer_handle_t = core::ptr::null_mut();
        // SAFETY: plain driver calls from the main task during boot; the
        // callback context outlives the timer because it is 'static.
        unsafe {
            let config = gptimer_config_t {
                clk_src: soc_periph_gptimer_clk_src_t_GPTIMER_CLK_SRC_DEFAULT,
                direction: gptimer_count_direction_t_GPTIMER_COUNT_UP,
                resolution_hz: TIMER_TICK_HZ,
                ..Default::default()
            };
            check(gptimer_new_timer(&config, &mut handle))?;

            let callbacks = gptimer_event_callbacks_t {
                on_alarm: Some(sample_alarm_isr),
            };
            check(gptimer_register_event_callbacks(
                handle,
                &callbacks,
                tick as *const TickFlag as *mut core::ffi::c_void,
            ))?;
            check(gptimer_enable(handle))?;
        }
        info!("hw_timer: GPTimer ready at {} Hz", TIMER_TICK_HZ);
        Ok(Self {
            handle,
            configured: false,
            running: false,
        })
    }
}

#[cfg(target_os = "espidf")]
impl TickTimer for GpTimer {
    fn configure(&mut self, compare: u32) -> Result<(), TimerError> {
        if self.running {
            return Err(TimerError::Running);
        }
        let mut alarm = gptimer_alarm_config_t {
            alarm_count: u64::from(compare),
            reload_count: 0,
            ..Default::default()
        };
        alarm.flags.set_auto_reload_on_alarm(1);
        // SAFETY: handle is valid for the lifetime of self.
        check(unsafe { gptimer_set_alarm_action(self.handle, &alarm) })?;
        self.configured = true;
        Ok(())
    }

    fn start(&mut self) -> Result<(), TimerError> {
        if !self.configured {
            return Err(TimerError::NotConfigured);
        }
        if self.running {
            return Ok(());
        }
        // SAFETY: handle is valid and enabled.
        check(unsafe { gptimer_start(self.handle) })?;
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TimerError> {
        if !self.running {
            return Ok(());
        }
        // SAFETY: handle is valid and running.
        check(unsafe { gptimer_stop(self.handle) })?;
        self.running = false;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), TimerError> {
        if self.running {
            return Err(TimerError::Running);
        }
        // SAFETY: handle is valid.
        check(unsafe { gptimer_set_raw_count(self.handle, 0) })
    }

    fn clear_pending_interrupt(&mut self) {
        // The GPTimer driver acknowledges the alarm inside its own ISR
        // before our callback runs; once stopped nothing stays latched.
    }
}

// ---------------------------------------------------------------------------
// Host model
// ---------------------------------------------------------------------------

/// Register-level model of the sampling timer for host builds.
///
/// [`advance`](Self::advance) moves the counter and latches alarms;
/// [`service_interrupt`](Self::service_interrupt) plays the ISR.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimTimer {
    compare: Option<u32>,
    counter: u32,
    running: bool,
    pending: bool,
}

#[cfg(not(target_os = "espidf"))]
impl SimTimer {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn compare(&self) -> Option<u32> {
        self.compare
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn interrupt_pending(&self) -> bool {
        self.pending
    }

    /// Count `ticks` timer ticks.  Each time the counter reaches the
    /// compare value an alarm is latched and the counter reloads to zero.
    /// Returns the number of alarms raised.
    pub fn advance(&mut self, ticks: u32) -> u32 {
        let Some(compare) = self.compare.filter(|_| self.running) else {
            return 0;
        };
        let total = u64::from(self.counter) + u64::from(ticks);
        let fired = (total / u64::from(compare)) as u32;
        self.counter = (total % u64::from(compare)) as u32;
        if fired > 0 {
            self.pending = true;
        }
        fired
    }

    /// Run the alarm ISR for a latched alarm.
    pub fn service_interrupt(&mut self, flag: &crate::events::TickFlag) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        flag.on_interrupt();
        true
    }
}

#[cfg(not(target_os = "espidf"))]
impl TickTimer for SimTimer {
    fn configure(&mut self, compare: u32) -> Result<(), TimerError> {
        if self.running {
            return Err(TimerError::Running);
        }
        if compare == 0 {
            return Err(TimerError::NotConfigured);
        }
        self.compare = Some(compare);
        Ok(())
    }

    fn start(&mut self) -> Result<(), TimerError> {
        if self.compare.is_none() {
            return Err(TimerError::NotConfigured);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TimerError> {
        self.running = false;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), TimerError> {
        if self.running {
            return Err(TimerError::Running);
        }
        self.counter = 0;
        Ok(())
    }

    fn clear_pending_interrupt(&mut self) {
        self.pending = false;
    }
}
