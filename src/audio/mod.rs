// Audio module - Audio clocks, click synthesis and the CPAL backend

pub mod click;
pub mod clock;
pub mod cpal_clock;
pub mod timing;
