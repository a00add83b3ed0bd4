use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme::Theme;

const DEFAULT_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastLevel::Info => "ℹ",
            ToastLevel::Success => "✓",
            ToastLevel::Warning => "⚠",
            ToastLevel::Error => "✗",
        }
    }
}

/// A short-lived notification in the top-right corner.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, level: ToastLevel) -> Self {
        Self {
            message: message.into(),
            level,
            created_at: Instant::now(),
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }

    /// Remaining lifetime in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        let total = self.ttl.as_secs_f32();
        if total <= 0.0 {
            return 0.0;
        }
        1.0 - (self.created_at.elapsed().as_secs_f32() / total).clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
pub struct ToastManager {
    toasts: Vec<Toast>,
    max_visible: usize,
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            toasts: Vec::new(),
            max_visible: 4,
        }
    }

    pub fn push(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Toast::new(message, ToastLevel::Info));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Toast::new(message, ToastLevel::Success));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Toast::new(message, ToastLevel::Warning));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Toast::new(message, ToastLevel::Error));
    }

    pub fn cleanup(&mut self) {
        self.toasts.retain(|t| !t.is_expired());
    }

    /// Newest first.
    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter().rev().take(self.max_visible)
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn render(&self, frame: &mut Frame, screen: Rect, theme: &dyn Theme) {
        let width = 44u16.min(screen.width.saturating_sub(4));
        let height = 4u16;
        let x = screen.width.saturating_sub(width + 2);
        let mut y = 4u16;

        for toast in self.visible() {
            if y + height > screen.height {
                break;
            }
            Self::render_toast(frame, Rect::new(x, y, width, height), toast, theme);
            y += height;
        }
    }

    fn render_toast(frame: &mut Frame, area: Rect, toast: &Toast, theme: &dyn Theme) {
        frame.render_widget(Clear, area);

        let color = match toast.level {
            ToastLevel::Info => theme.info(),
            ToastLevel::Success => theme.success(),
            ToastLevel::Warning => theme.warning(),
            ToastLevel::Error => theme.error(),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(theme.surface()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let body = Paragraph::new(Line::from(vec![
            Span::styled(
                format!("{} ", toast.level.icon()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(toast.message.clone(), Style::default().fg(theme.foreground())),
        ]))
        .wrap(Wrap { trim: true });
        frame.render_widget(
            body,
            Rect::new(inner.x, inner.y, inner.width, inner.height.saturating_sub(1)),
        );

        let bar = (inner.width as f32 * toast.progress()) as u16;
        if bar > 0 && inner.height > 0 {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "─".repeat(bar as usize),
                    Style::default().fg(color),
                )),
                Rect::new(inner.x, inner.y + inner.height - 1, bar, 1),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_and_counts() {
        let mut manager = ToastManager::new();
        assert!(manager.is_empty());

        manager.success("Brand created");
        manager.warning("select a brand first");
        manager.error("timeout");
        assert_eq!(manager.len(), 3);

        let newest = manager.visible().next().unwrap();
        assert_eq!(newest.level, ToastLevel::Error);
        assert_eq!(newest.level.icon(), "✗");
    }

    #[test]
    fn test_cleanup_drops_expired() {
        let mut manager = ToastManager::new();
        manager.push(Toast::new("gone", ToastLevel::Info).with_ttl(Duration::ZERO));
        manager.info("stays");

        manager.cleanup();
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.visible().next().unwrap().message, "stays");
    }

    #[test]
    fn test_visible_is_capped() {
        let mut manager = ToastManager::new();
        for i in 0..10 {
            manager.info(format!("toast {}", i));
        }
        assert_eq!(manager.visible().count(), 4);
    }

    #[test]
    fn test_progress_bounds() {
        let fresh = Toast::new("x", ToastLevel::Info).with_ttl(Duration::from_secs(60));
        assert!(fresh.progress() > 0.9);
        let done = Toast::new("x", ToastLevel::Info).with_ttl(Duration::ZERO);
        assert_eq!(done.progress(), 0.0);
    }
}
