use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget},
};

use super::{MarketContext, MarketRequest, render_placeholder, step};
use crate::domain::entities::CreditAccount;
use crate::domain::keybinding::{Action, Keybind};
use crate::presentation::commands::{CommandRegistry, HasCommands};
use crate::presentation::ui::backend::BackendCommand;
use crate::presentation::ui::utils::clean_text;

/// Credit balance and transaction history.
#[derive(Default)]
pub struct CreditsView {
    account: Option<CreditAccount>,
    table_state: TableState,
    loading: bool,
}

impl CreditsView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn account(&self) -> Option<&CreditAccount> {
        self.account.as_ref()
    }

    pub fn on_activate(&mut self) -> Vec<MarketRequest> {
        if self.account.is_some() || self.loading {
            return Vec::new();
        }
        self.request()
    }

    /// The account arrives with the initial data; this only marks it in flight.
    pub fn begin_initial(&mut self) {
        self.loading = true;
    }

    fn request(&mut self) -> Vec<MarketRequest> {
        self.loading = true;
        vec![MarketRequest::Command(BackendCommand::LoadCredits)]
    }

    pub fn handle_action(&mut self, action: Action) -> Vec<MarketRequest> {
        let len = self.account.as_ref().map_or(0, |a| a.transactions.len());
        match action {
            Action::NavigateDown => self.table_state.select(step(self.table_state.selected(), len, 1)),
            Action::NavigateUp => self.table_state.select(step(self.table_state.selected(), len, -1)),
            Action::LoadMore => return self.request(),
            _ => {}
        }
        Vec::new()
    }

    pub fn set_account(&mut self, account: CreditAccount, ctx: &mut MarketContext) {
        self.loading = false;
        ctx.credits = Some(account.balance);
        if self.table_state.selected().is_none() && !account.transactions.is_empty() {
            self.table_state.select(Some(0));
        }
        self.account = Some(account);
    }

    pub fn on_load_failed(&mut self) {
        self.loading = false;
    }

    /// Pushed balance change. The history is refetched to pick up the new entry.
    pub fn on_balance_updated(&mut self, balance: i64, ctx: &mut MarketContext) -> Vec<MarketRequest> {
        ctx.credits = Some(balance);
        if let Some(account) = self.account.as_mut() {
            account.balance = balance;
        }
        if self.loading {
            return Vec::new();
        }
        self.request()
    }

    pub fn render(&mut self, ctx: &MarketContext, area: Rect, buf: &mut Buffer) {
        let theme = &ctx.theme;
        let Some(account) = &self.account else {
            let message = if self.loading {
                "Loading credits…"
            } else {
                "Credits unavailable. Press n to retry."
            };
            render_placeholder(" Credits ", message, theme, area, buf);
            return;
        };

        let [summary_area, table_area] =
            Layout::vertical([Constraint::Length(4), Constraint::Min(3)]).areas(area);

        let summary = vec![
            Line::from(vec![
                Span::styled("Balance  ", theme.dimmed_style),
                Span::styled(
                    format!("{} credits", account.balance),
                    theme.price_style.add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Spent    ", theme.dimmed_style),
                Span::styled(format!("{} credits", account.total_spent()), theme.base_style),
            ]),
        ];
        Paragraph::new(summary)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.accent))
                    .title(" Credits "),
            )
            .render(summary_area, buf);

        if account.transactions.is_empty() {
            render_placeholder(" History ", "No transactions yet", theme, table_area, buf);
            return;
        }

        let rows: Vec<Row<'_>> = account
            .recent_transactions()
            .into_iter()
            .map(|t| {
                let amount_style = if t.is_debit() {
                    theme.error_style
                } else {
                    theme.success_style
                };
                Row::new(vec![
                    Cell::from(
                        t.created_at
                            .with_timezone(&chrono::Local)
                            .format(&ctx.settings.date_format)
                            .to_string(),
                    )
                    .style(theme.dimmed_style),
                    Cell::from(t.signed_amount()).style(amount_style),
                    Cell::from(clean_text(&t.reason)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(10),
                Constraint::Min(10),
            ],
        )
        .header(
            Row::new(vec!["Date", "Amount", "Reason"])
                .style(theme.highlight_style.add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.dimmed_style)
                .title(format!(" History ({}) ", account.transactions.len())),
        )
        .row_highlight_style(theme.selection_style);
        StatefulWidget::render(table, table_area, buf, &mut self.table_state);
    }
}

impl HasCommands for CreditsView {
    fn get_commands(&self, registry: &CommandRegistry) -> Vec<Keybind> {
        registry
            .keybind(Action::LoadMore, "Refresh")
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{commands, context};
    use super::*;
    use crate::domain::entities::{CreditTransaction, TransactionId};
    use chrono::Utc;

    fn account(balance: i64) -> CreditAccount {
        CreditAccount {
            balance,
            transactions: vec![CreditTransaction {
                id: TransactionId(1),
                amount: -5,
                reason: "Featured listing".to_string(),
                created_at: Utc::now(),
            }],
        }
    }

    #[test]
    fn test_activation_requests_once() {
        let mut view = CreditsView::new();
        assert!(matches!(
            commands(&view.on_activate())[..],
            [BackendCommand::LoadCredits]
        ));
        assert!(view.on_activate().is_empty());
    }

    #[test]
    fn test_set_account_updates_header_balance() {
        let mut ctx = context();
        let mut view = CreditsView::new();
        view.on_activate();
        view.set_account(account(42), &mut ctx);

        assert_eq!(ctx.credits, Some(42));
        assert_eq!(view.account().map(CreditAccount::total_spent), Some(5));
    }

    #[test]
    fn test_pushed_balance_refetches_history() {
        let mut ctx = context();
        let mut view = CreditsView::new();
        view.on_activate();
        view.set_account(account(42), &mut ctx);

        let requests = view.on_balance_updated(30, &mut ctx);
        assert_eq!(ctx.credits, Some(30));
        assert_eq!(view.account().map(|a| a.balance), Some(30));
        assert!(matches!(commands(&requests)[..], [BackendCommand::LoadCredits]));
    }
}
