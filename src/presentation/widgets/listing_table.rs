//! Table of listings shared by the browse, favorites and moderation views.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, StatefulWidget, Table, TableState},
};

use crate::domain::entities::{Listing, ListingStatus};
use crate::presentation::theme::Theme;

pub struct ListingTable<'a> {
    listings: &'a [Listing],
    theme: &'a Theme,
    title: String,
    date_format: &'a str,
    show_images_count: bool,
    loading: bool,
    empty_message: &'a str,
    focused: bool,
}

impl<'a> ListingTable<'a> {
    #[must_use]
    pub fn new(listings: &'a [Listing], theme: &'a Theme) -> Self {
        Self {
            listings,
            theme,
            title: String::from(" Listings "),
            date_format: "%Y-%m-%d",
            show_images_count: true,
            loading: false,
            empty_message: "No listings",
            focused: true,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub const fn date_format(mut self, format: &'a str) -> Self {
        self.date_format = format;
        self
    }

    #[must_use]
    pub const fn show_images_count(mut self, show: bool) -> Self {
        self.show_images_count = show;
        self
    }

    #[must_use]
    pub const fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    #[must_use]
    pub const fn empty_message(mut self, message: &'a str) -> Self {
        self.empty_message = message;
        self
    }

    #[must_use]
    pub const fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn row(&self, listing: &'a Listing) -> Row<'a> {
        let star = if listing.is_favorite() {
            Span::styled("★", self.theme.highlight_style)
        } else {
            Span::styled("☆", self.theme.dimmed_style)
        };

        let mut title = vec![Span::raw(listing.title())];
        if self.show_images_count && !listing.images().is_empty() {
            title.push(Span::styled(
                format!(" [{}]", listing.images().len()),
                self.theme.dimmed_style,
            ));
        }
        if listing.status() != ListingStatus::Active {
            title.push(Span::styled(
                format!(" ({})", listing.status().label()),
                self.theme.dimmed_style.add_modifier(Modifier::ITALIC),
            ));
        }

        Row::new(vec![
            Cell::from(Line::from(star)),
            Cell::from(Line::from(title)),
            Cell::from(Line::from(listing.price().to_string()).right_aligned())
                .style(self.theme.price_style),
            Cell::from(listing.category_label()),
            Cell::from(listing.location_label()),
            Cell::from(listing.seller_label()),
            Cell::from(listing.created_at().format(self.date_format).to_string())
                .style(self.theme.dimmed_style),
        ])
    }
}

impl StatefulWidget for ListingTable<'_> {
    type State = TableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let border_style = if self.focused {
            Style::default().fg(self.theme.accent)
        } else {
            self.theme.dimmed_style
        };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(self.title.clone());
        if self.loading {
            block = block.title_bottom(Line::from(" loading… ").right_aligned());
        }

        if self.listings.is_empty() {
            let message = if self.loading { "Loading…" } else { self.empty_message };
            let inner = block.inner(area);
            ratatui::widgets::Widget::render(block, area, buf);
            ratatui::widgets::Widget::render(
                ratatui::widgets::Paragraph::new(message).style(self.theme.dimmed_style),
                inner,
                buf,
            );
            return;
        }

        let header = Row::new(vec!["", "Title", "Price", "Category", "Location", "Seller", "Posted"])
            .style(self.theme.dimmed_style.add_modifier(Modifier::BOLD));
        let rows: Vec<Row<'_>> = self.listings.iter().map(|l| self.row(l)).collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(1),
                Constraint::Fill(3),
                Constraint::Length(14),
                Constraint::Fill(1),
                Constraint::Fill(1),
                Constraint::Fill(1),
                Constraint::Length(10),
            ],
        )
        .header(header)
        .block(block)
        .row_highlight_style(self.theme.selection_style)
        .column_spacing(1);

        StatefulWidget::render(table, area, buf, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Money, SellerSummary, UserId};
    use chrono::Utc;
    use ratatui::{Terminal, backend::TestBackend};

    fn listing(id: u64, title: &str, favorite: bool) -> Listing {
        Listing::new(
            id,
            title,
            &Money::new(12_50, "EUR"),
            SellerSummary {
                id: UserId(9),
                name: "Ada".into(),
            },
            Utc::now(),
        )
        .with_favorite(favorite)
    }

    fn render(listings: &[Listing], loading: bool) -> String {
        let backend = TestBackend::new(100, 6);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::default();
        let mut state = TableState::default().with_selected(Some(0));
        terminal
            .draw(|frame| {
                let table = ListingTable::new(listings, &theme).loading(loading);
                frame.render_stateful_widget(table, frame.area(), &mut state);
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        (0..6)
            .map(|y| (0..100).map(|x| buffer[(x, y)].symbol().to_string()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_renders_rows() {
        let text = render(&[listing(1, "Oak desk", true), listing(2, "Lamp", false)], false);
        assert!(text.contains("Oak desk"));
        assert!(text.contains("12.50 EUR"));
        assert!(text.contains('★'));
        assert!(text.contains("Ada"));
    }

    #[test]
    fn test_empty_and_loading() {
        assert!(render(&[], false).contains("No listings"));
        assert!(render(&[], true).contains("Loading…"));
    }
}
