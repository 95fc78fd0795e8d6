use iced::{Border, Color, Shadow, Theme};
use iced::widget::button::{StyleSheet, Appearance};

use crate::device::types::DeviceState;
use crate::panel::types::Severity;

/// A button without chrome, used for the inactive tab.
pub struct FlatButtonStyleSheet;

impl StyleSheet for FlatButtonStyleSheet {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> Appearance {
        Appearance {
            shadow_offset: Default::default(),
            background: None,
            text_color: Color::from_rgb8(0x55, 0x55, 0x55),
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 0.0.into(),
            },
            shadow: Shadow::default(),
        }
    }
}

pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Success => Color::from_rgb8(0x2e, 0x7d, 0x32),
        Severity::Error => Color::from_rgb8(0xc6, 0x28, 0x28),
        Severity::Info => Color::from_rgb8(0x15, 0x65, 0xc0),
    }
}

pub fn state_color(state: DeviceState) -> Color {
    match state {
        DeviceState::On => Color::from_rgb8(0x2e, 0x7d, 0x32),
        DeviceState::Off => Color::from_rgb8(0x75, 0x75, 0x75),
        DeviceState::Unknown => Color::from_rgb8(0xef, 0x6c, 0x00),
    }
}
