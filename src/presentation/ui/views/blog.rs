use chrono::Utc;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

use super::{MarketContext, MarketRequest, ViewSettings, at_end, render_placeholder, step};
use crate::domain::entities::BlogPost;
use crate::domain::errors::ApiError;
use crate::domain::keybinding::{Action, Keybind};
use crate::domain::pagination::{Generation, Page, PagedList};
use crate::presentation::commands::{CommandRegistry, HasCommands};
use crate::presentation::ui::backend::BackendCommand;
use crate::presentation::ui::utils::{format_age, wrap_text};

const PAGE_SCROLL: i16 = 10;

pub struct BlogView {
    posts: PagedList<BlogPost>,
    list_state: ListState,
    article: Option<BlogPost>,
    scroll: u16,
    loaded: bool,
}

impl BlogView {
    #[must_use]
    pub fn new(settings: &ViewSettings) -> Self {
        Self {
            posts: PagedList::new(settings.page_size),
            list_state: ListState::default(),
            article: None,
            scroll: 0,
            loaded: false,
        }
    }

    #[must_use]
    pub fn posts(&self) -> &[BlogPost] {
        self.posts.items()
    }

    #[must_use]
    pub const fn article(&self) -> Option<&BlogPost> {
        self.article.as_ref()
    }

    pub fn on_activate(&mut self) -> Vec<MarketRequest> {
        if self.loaded {
            return Vec::new();
        }
        self.loaded = true;
        let (generation, page) = self.posts.begin_reset();
        vec![MarketRequest::Command(BackendCommand::LoadBlogPosts { generation, page })]
    }

    fn load_more(&mut self) -> Vec<MarketRequest> {
        self.posts
            .begin_next()
            .map(|(generation, page)| {
                vec![MarketRequest::Command(BackendCommand::LoadBlogPosts { generation, page })]
            })
            .unwrap_or_default()
    }

    fn scroll_by(&mut self, delta: i16) {
        self.scroll = self.scroll.saturating_add_signed(delta);
    }

    pub fn handle_action(&mut self, action: Action) -> Vec<MarketRequest> {
        if self.article.is_some() {
            match action {
                Action::NavigateDown => self.scroll_by(1),
                Action::NavigateUp => self.scroll_by(-1),
                Action::ScrollDown => self.scroll_by(PAGE_SCROLL),
                Action::ScrollUp => self.scroll_by(-PAGE_SCROLL),
                Action::Cancel => {
                    self.article = None;
                    self.scroll = 0;
                }
                _ => {}
            }
            return Vec::new();
        }

        match action {
            Action::NavigateDown => {
                let len = self.posts.len();
                self.list_state.select(step(self.list_state.selected(), len, 1));
                if at_end(self.list_state.selected(), len) {
                    return self.load_more();
                }
                Vec::new()
            }
            Action::NavigateUp => {
                self.list_state
                    .select(step(self.list_state.selected(), self.posts.len(), -1));
                Vec::new()
            }
            Action::ScrollDown => {
                self.list_state.select(step(
                    self.list_state.selected(),
                    self.posts.len(),
                    isize::from(PAGE_SCROLL),
                ));
                Vec::new()
            }
            Action::ScrollUp => {
                self.list_state.select(step(
                    self.list_state.selected(),
                    self.posts.len(),
                    -isize::from(PAGE_SCROLL),
                ));
                Vec::new()
            }
            Action::LoadMore => self.load_more(),
            Action::Select => {
                let Some(post) = self
                    .list_state
                    .selected()
                    .and_then(|i| self.posts.items().get(i))
                else {
                    return Vec::new();
                };
                self.scroll = 0;
                if post.has_body() {
                    self.article = Some(post.clone());
                    Vec::new()
                } else {
                    vec![MarketRequest::Command(BackendCommand::LoadBlogPost(
                        post.slug().to_string(),
                    ))]
                }
            }
            _ => Vec::new(),
        }
    }

    pub fn on_posts_loaded(&mut self, generation: Generation, result: Result<Page<BlogPost>, ApiError>) {
        match result {
            Ok(page) => {
                if self.posts.apply(generation, page)
                    && self.list_state.selected().is_none()
                    && !self.posts.is_empty()
                {
                    self.list_state.select(Some(0));
                }
            }
            Err(_) => self.posts.fail(generation),
        }
    }

    /// Opens the fetched article and caches its body in the list.
    pub fn on_post_loaded(&mut self, post: BlogPost) {
        self.posts.replace_item(post.clone());
        self.scroll = 0;
        self.article = Some(post);
    }

    pub fn render(&mut self, ctx: &MarketContext, area: Rect, buf: &mut Buffer) {
        if let Some(post) = &self.article {
            render_article(post, self.scroll, ctx, area, buf);
            return;
        }

        let theme = &ctx.theme;
        if self.posts.is_empty() {
            let message = if self.posts.is_loading() {
                "Loading articles…"
            } else {
                "No articles published yet"
            };
            render_placeholder(" Blog ", message, theme, area, buf);
            return;
        }

        let now = Utc::now();
        let items: Vec<ListItem<'_>> = self
            .posts
            .items()
            .iter()
            .map(|post| {
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(
                            post.title().to_string(),
                            theme.base_style.add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!(
                                "  {} · {}",
                                post.author_label(),
                                format_age(post.published_at(), now, &ctx.settings.date_format)
                            ),
                            theme.dimmed_style,
                        ),
                    ]),
                    Line::from(Span::styled(
                        format!("  {}", post.summary().replace('\n', " ")),
                        theme.dimmed_style,
                    )),
                ])
            })
            .collect();

        let mut title = format!(" Blog ({}) ", self.posts.len());
        if self.posts.is_loading() {
            title.push_str("loading… ");
        }
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.accent))
                    .title(title),
            )
            .highlight_style(theme.selection_style);
        StatefulWidget::render(list, area, buf, &mut self.list_state);
    }
}

fn render_article(post: &BlogPost, scroll: u16, ctx: &MarketContext, area: Rect, buf: &mut Buffer) {
    let theme = &ctx.theme;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .title(format!(" {} ", post.title()));
    let inner = block.inner(area);
    block.render(area, buf);

    let [meta_area, body_area] =
        Layout::vertical([Constraint::Length(2), Constraint::Min(1)]).areas(inner);

    let mut meta = vec![Span::styled(
        format!(
            "{} · {}",
            post.author_label(),
            post.published_at().format(&ctx.settings.date_format)
        ),
        theme.dimmed_style,
    )];
    if !post.tags().is_empty() {
        meta.push(Span::styled(
            format!("  #{}", post.tags().join(" #")),
            theme.highlight_style,
        ));
    }
    Paragraph::new(Line::from(meta)).render(meta_area, buf);

    let lines: Vec<Line<'_>> = wrap_text(post.body(), usize::from(body_area.width))
        .into_iter()
        .map(|l| Line::from(Span::styled(l, theme.base_style)))
        .collect();
    let max_scroll = u16::try_from(lines.len())
        .unwrap_or(u16::MAX)
        .saturating_sub(body_area.height);
    Paragraph::new(lines)
        .scroll((scroll.min(max_scroll), 0))
        .render(body_area, buf);
}

impl HasCommands for BlogView {
    fn get_commands(&self, registry: &CommandRegistry) -> Vec<Keybind> {
        let actions: &[(Action, &'static str)] = if self.article.is_some() {
            &[
                (Action::ScrollDown, "Page down"),
                (Action::ScrollUp, "Page up"),
                (Action::Cancel, "Back"),
            ]
        } else {
            &[(Action::Select, "Read"), (Action::LoadMore, "More")]
        };
        actions
            .iter()
            .filter_map(|(action, label)| registry.keybind(*action, *label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::commands;
    use super::*;

    fn post(id: u64, body: &str) -> BlogPost {
        BlogPost::new(id, format!("post-{id}"), format!("Post {id}"), Utc::now())
            .with_excerpt("excerpt")
            .with_body(body)
    }

    fn loaded(posts: Vec<BlogPost>) -> BlogView {
        let mut view = BlogView::new(&ViewSettings::default());
        let requests = view.on_activate();
        let Some(MarketRequest::Command(BackendCommand::LoadBlogPosts { generation, .. })) =
            requests.first()
        else {
            panic!("expected blog load");
        };
        view.on_posts_loaded(*generation, Ok(Page::new(posts, 1, 20, None)));
        view
    }

    #[test]
    fn test_select_without_body_fetches_article() {
        let mut view = loaded(vec![post(1, "")]);
        let requests = view.handle_action(Action::Select);
        assert!(matches!(
            commands(&requests)[..],
            [BackendCommand::LoadBlogPost(slug)] if slug == "post-1"
        ));
        assert!(view.article().is_none());

        view.on_post_loaded(post(1, "Full text"));
        assert_eq!(view.article().map(BlogPost::body), Some("Full text"));
        assert!(view.posts()[0].has_body());
    }

    #[test]
    fn test_select_with_body_opens_directly() {
        let mut view = loaded(vec![post(1, "Already here")]);
        assert!(view.handle_action(Action::Select).is_empty());
        assert!(view.article().is_some());
    }

    #[test]
    fn test_scroll_keys_move_article_and_cancel_closes() {
        let mut view = loaded(vec![post(1, "Body")]);
        view.handle_action(Action::Select);

        view.handle_action(Action::ScrollDown);
        view.handle_action(Action::NavigateDown);
        assert_eq!(view.scroll, 11);
        view.handle_action(Action::NavigateUp);
        view.handle_action(Action::ScrollUp);
        view.handle_action(Action::ScrollUp);
        assert_eq!(view.scroll, 0);

        view.handle_action(Action::Cancel);
        assert!(view.article().is_none());
    }

    #[test]
    fn test_activation_loads_once() {
        let mut view = loaded(vec![post(1, "")]);
        assert!(view.on_activate().is_empty());
    }
}
