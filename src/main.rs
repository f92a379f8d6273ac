use std::{
    any::Any,
    fmt::{self, Display},
    fs,
    future::Future,
    io,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{Arc, Mutex},
    time::Duration,
};

use clap::Parser;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyModifiers};

use futures::StreamExt;
use tokio::runtime::Runtime;

use tui::{
    backend::{Backend, CrosstermBackend},
    text::{Span, Spans},
    Frame, Terminal,
};

use shopfinder::{
    filter::CarFilter,
    geo::{self, GeoError, LatLng, MapBounds, RadiusKm},
    locator::{format_km, Locator},
    query::ViewQuery,
    util::{DotsSpinner, WrappingList},
    Api, Place,
};

#[derive(Parser, Debug)]
#[command(name = "shopfinder")]
#[command(about = "Find car service shops near you.", long_about = None)]
struct Cli {
    /// Base url of the cars/shops backend
    #[arg(long, env = "SHOPFINDER_API", default_value = shopfinder::DEFAULT_API)]
    api: reqwest::Url,

    /// Your position as `lat,lng`
    #[arg(long)]
    at: Option<LatLng>,

    /// Search radius in km, `inf` for no limit
    #[arg(short, long)]
    radius: Option<RadiusKm>,

    /// View to restore, as a query string like `?shop=Key+Auto+Center&radius=5`
    #[arg(long)]
    state: Option<ViewQuery>,

    /// Write logs to this file. RUST_LOG controls the level.
    #[arg(long)]
    log: Option<PathBuf>,
}

trait ParamValue: Display + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn cloned(&self) -> Box<dyn ParamValue>;
    fn from_str(&mut self, s: &str) -> bool;
}

impl<E, T: Clone + Display + Send + Sync + FromStr<Err = E> + 'static> ParamValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn cloned(&self) -> Box<dyn ParamValue> {
        Box::new(self.clone())
    }

    fn from_str(&mut self, s: &str) -> bool {
        match s.parse() {
            Ok(r) => {
                *self = r;
                true
            }
            Err(_) => false,
        }
    }
}

/// The user position as an editable option, empty when unknown.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Location(Option<LatLng>);

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(p) => write!(f, "{p}"),
            None => write!(f, "unknown"),
        }
    }
}

impl FromStr for Location {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() || s.trim() == "unknown" {
            return Ok(Location(None));
        }
        s.parse().map(|p| Location(Some(p)))
    }
}

struct State {
    focus: WidgetId,
    user_address: String,
    places: WrappingList<Place>,
    filter: CarFilter,
    locator: Locator,
    params: WrappingList<(&'static str, Box<dyn ParamValue>)>,
    worker_state: WorkerState,
    fetching_spinner: DotsSpinner,
    parm_edit_state: Option<ParmEditState>,
    api: Api,
    pending_shop: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WidgetId {
    Search,
    Places,
    Brands,
    Models,
    Shops,
    Details,
    Options,
    Help,
    Error,
    ParamEdit,
}

enum WorkerState {
    Idle,
    Fetching,
    Error(anyhow::Error),
}

struct ParmEditState {
    buffer: String,
    value: Box<dyn ParamValue>,
    is_valid: bool,
}

impl ParmEditState {
    fn new(mut value: Box<dyn ParamValue>) -> Self {
        let buffer = value.to_string();
        let is_valid = value.from_str(&buffer);
        ParmEditState {
            buffer,
            value,
            is_valid,
        }
    }
}

impl State {
    const RADIUS_OPTION: &'static str = "Radius (km)";
    const LOCATION_OPTION: &'static str = "Location";
    const FILTER_OPTION: &'static str = "Show car filter";

    fn new(api: Api, at: Option<LatLng>, radius: RadiusKm, pending_shop: Option<String>) -> Self {
        let mut locator = Locator::new(radius);
        locator.set_center(at);

        State {
            focus: if at.is_some() {
                WidgetId::Shops
            } else {
                WidgetId::Search
            },
            user_address: String::new(),
            places: WrappingList::new(vec![]),
            filter: CarFilter::new(),
            locator,
            params: WrappingList::new(vec![
                (Self::RADIUS_OPTION, Box::new(radius)),
                (Self::LOCATION_OPTION, Box::new(Location(at))),
                (Self::FILTER_OPTION, Box::new(true)),
            ]),
            worker_state: WorkerState::Idle,
            fetching_spinner: DotsSpinner::new(),
            parm_edit_state: None,
            api,
            pending_shop,
        }
    }

    fn worker_busy(&self) -> bool {
        match self.worker_state {
            WorkerState::Fetching => true,
            WorkerState::Idle | WorkerState::Error(_) => false,
        }
    }

    fn max_option_key_len(&self) -> usize {
        self.params
            .iter()
            .map(|(k, _)| k.len())
            .max()
            .unwrap_or_default()
    }

    fn param<T: Any>(&self, key: &str) -> &T {
        for (k, v) in self.params.iter() {
            if k != &key {
                continue;
            }

            return v.as_any().downcast_ref::<T>().expect("invalid param type");
        }

        panic!("parameter {} not found", key)
    }

    fn set_param(&mut self, key: &str, value: Box<dyn ParamValue>) {
        if let Some((_, v)) = self.params.iter_mut().find(|(k, _)| *k == key) {
            *v = value;
        }
        self.apply_params();
    }

    fn set_current_param(&mut self, value: Box<dyn ParamValue>) {
        if let Some((_, v)) = self.params.selected_mut() {
            *v = value;
        }
        self.apply_params();
    }

    /// Push the option values into the filter and the locator.
    fn apply_params(&mut self) {
        let radius = *self.param::<RadiusKm>(Self::RADIUS_OPTION);
        let Location(at) = *self.param::<Location>(Self::LOCATION_OPTION);
        let show_filter = *self.param::<bool>(Self::FILTER_OPTION);

        if self.locator.radius() != radius {
            tracing::info!(%radius, "radius changed");
            self.locator.set_radius(radius);
        }
        if self.locator.center() != at {
            tracing::info!(location = %Location(at), "location changed");
            self.locator.set_center(at);
        }
        self.filter.set_visible(show_filter);

        if !show_filter && matches!(self.focus, WidgetId::Brands | WidgetId::Models) {
            self.focus = WidgetId::Shops;
        }
    }

    fn tab_order(&self) -> Vec<WidgetId> {
        let mut order = vec![WidgetId::Search, WidgetId::Places];
        if self.filter.is_visible() {
            order.extend([WidgetId::Brands, WidgetId::Models]);
        }
        order.push(WidgetId::Shops);
        if self.locator.details_open() {
            order.push(WidgetId::Details);
        }
        order.extend([WidgetId::Options, WidgetId::Help]);
        order
    }

    fn link(&self) -> String {
        self.locator.query().to_query_string()
    }

    fn fetch<T: Send + 'static>(
        &mut self,
        state: Arc<Mutex<Self>>,
        fut: impl Future<Output = anyhow::Result<T>> + Send + 'static,
        mut on_success: impl FnMut(&mut Self, T) -> anyhow::Result<()> + Send + 'static,
    ) {
        self.worker_state = WorkerState::Fetching;
        self.fetching_spinner = DotsSpinner::new();

        let _complete = tokio::task::spawn(async move {
            match fut.await {
                Ok(d) => {
                    let mut state = state.lock().unwrap();
                    state.worker_state = WorkerState::Idle;
                    if let Err(e) = on_success(&mut state, d) {
                        state.fail(e);
                    }
                }
                Err(e) => {
                    let mut state = state.lock().unwrap();
                    state.fail(e);
                }
            }
        });
    }

    fn fail(&mut self, e: anyhow::Error) {
        tracing::error!(error = %e, "request failed");
        self.worker_state = WorkerState::Error(e);
        self.focus = WidgetId::Error;
        self.fetching_spinner = DotsSpinner::new();
    }

    /// Load cars and shops from the backend.
    fn load(&mut self, state: Arc<Mutex<Self>>) {
        let api = self.api.clone();

        self.fetch(
            state,
            async move {
                let (cars, shops) = tokio::try_join!(api.cars(), api.shops())?;
                Ok((cars, shops))
            },
            |state, (cars, shops)| {
                state.filter.set_cars(cars);
                state.locator.set_shops(shops);

                if let Some(name) = state.pending_shop.take() {
                    if state.locator.open_by_name(&name) {
                        state.focus = WidgetId::Details;
                    }
                }
                Ok(())
            },
        );
    }
}

async fn main_loop(terminal: &mut Terminal<impl Backend>, state: State) -> anyhow::Result<String> {
    let mut reader = EventStream::new();
    let state = Arc::new(Mutex::new(state));

    {
        let mut st = state.lock().unwrap();
        st.load(Arc::clone(&state));
    }

    loop {
        terminal.draw(|f| {
            let mut state = state.lock().unwrap();
            draw(f, &mut state)
        })?;

        let ev = match tokio::time::timeout(Duration::from_millis(50), reader.next()).await {
            Err(_) => {
                // timeout expired
                continue;
            }
            Ok(ev) => ev,
        };

        let mut st = state.lock().unwrap();
        match ev {
            Some(Ok(event)) => {
                let KeyEvent {
                    code, modifiers, ..
                } = match event {
                    Event::Key(k) => k,
                    _ => continue,
                };

                if st.focus != WidgetId::ParamEdit {
                    if (code, modifiers) == (KeyCode::Char('c'), KeyModifiers::CONTROL)
                        || (code == KeyCode::Esc && st.focus != WidgetId::Details)
                    {
                        break;
                    }

                    if code == KeyCode::Tab || code == KeyCode::BackTab {
                        let tab_order = st.tab_order();
                        let current = tab_order.iter().position(|w| w == &st.focus).unwrap_or(0);
                        let next = current
                            + if code == KeyCode::Tab {
                                1
                            } else {
                                tab_order.len() - 1
                            };

                        st.focus = tab_order[next % tab_order.len()];
                        continue;
                    }
                }

                handle_key_event(code, &mut st, &state).await?;
            }
            Some(Err(_)) | None => break,
        }
    }

    let link = state.lock().unwrap().link();
    Ok(link)
}

fn draw(f: &mut Frame<impl Backend>, state: &mut State) {
    use tui::{
        layout::{Constraint, Direction, Layout},
        style::{Color, Modifier, Style},
        widgets::{
            canvas::{Canvas, Map, MapResolution, Points},
            Block, Borders, Clear, List, ListItem, Paragraph, Wrap,
        },
    };

    let focus = state.focus;
    let block = |widget, title| {
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(if focus == widget {
                Style::default().fg(Color::LightYellow)
            } else {
                Style::default()
            })
    };

    let list = |widget, title, symbol, items| {
        List::new(items)
            .block(block(widget, title))
            .highlight_symbol(symbol)
            .highlight_style(
                Style::default()
                    .fg(Color::LightYellow)
                    .add_modifier(Modifier::ITALIC | Modifier::DIM),
            )
    };

    let worker_busy = {
        match state.worker_state {
            WorkerState::Idle => false,
            WorkerState::Fetching => {
                state.fetching_spinner.tick();
                true
            }
            WorkerState::Error(ref e) => {
                let error = Paragraph::new(format!("{e:#}\n\nPress <Enter> to continue."))
                    .block(block(WidgetId::Error, "Error"))
                    .wrap(Wrap { trim: true });
                f.render_widget(error, f.size());
                return;
            }
        }
    };

    let hchunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(f.size());

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Percentage(20),
                Constraint::Percentage(if state.filter.is_visible() { 25 } else { 0 }),
                Constraint::Min(5),
            ]
            .as_ref(),
        )
        .split(hchunks[0]);

    let filter_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(left_chunks[2]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(hchunks[1]);

    let bottom_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(right_chunks[1]);

    let side_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(state.params.len() as u16 + 2),
            Constraint::Min(0),
        ])
        .split(bottom_chunks[1]);

    let symbol = if worker_busy {
        state.fetching_spinner.pattern().to_string() + " "
    } else {
        "> ".to_string()
    };

    let address_input = Paragraph::new(state.user_address.as_ref())
        .block(block(WidgetId::Search, "Where are you?"))
        .wrap(Wrap { trim: true });

    let found_places = list(
        WidgetId::Places,
        "Places",
        &symbol,
        state
            .places
            .iter()
            .map(|p| ListItem::new(p.display_name.clone()))
            .collect::<Vec<_>>(),
    );

    let brand_title = state.filter.brand_label().to_string();
    let brands = list(
        WidgetId::Brands,
        &brand_title,
        "> ",
        state
            .filter
            .brands()
            .iter()
            .map(|c| ListItem::new(c.name.clone()))
            .collect(),
    );

    let model_title = state.filter.model_label().to_string();
    let models = list(
        WidgetId::Models,
        &model_title,
        "> ",
        state
            .filter
            .model_labels()
            .into_iter()
            .map(|m| ListItem::new(m.to_string()))
            .collect(),
    );

    let shops_title = match state.locator.center() {
        Some(_) if state.locator.radius().is_unlimited() => "Shops, nearest first".to_string(),
        Some(_) => format!("Shops within {} km", state.locator.radius()),
        None => "Shops".to_string(),
    };
    let shops = list(
        WidgetId::Shops,
        &shops_title,
        &symbol,
        state
            .locator
            .entries()
            .map(|(shop, distance)| {
                let mut spans = vec![Span::raw(format!("{} {}⭐", shop.name, shop.rating))];
                if let Some(d) = distance {
                    spans.push(Span::styled(
                        format!(" ({})", format_km(d)),
                        Style::default().add_modifier(Modifier::ITALIC),
                    ));
                }
                ListItem::new(Spans::from(spans))
            })
            .collect(),
    );

    let details = match state.locator.details() {
        Some(details) => {
            let mut lines: Vec<Spans> = details
                .lines()
                .into_iter()
                .enumerate()
                .map(|(i, l)| {
                    if i == 0 {
                        Spans::from(Span::styled(l, Style::default().add_modifier(Modifier::BOLD)))
                    } else {
                        Spans::from(l)
                    }
                })
                .collect();
            lines.push(Spans::from(""));
            lines.push(Spans::from(Span::styled(
                "o: show on map  c: call  Esc: close",
                Style::default().add_modifier(Modifier::DIM),
            )));
            Paragraph::new(lines)
        }
        None => Paragraph::new("Select a shop and hit <Enter> to see its details."),
    }
    .block(block(WidgetId::Details, "Details"))
    .wrap(Wrap { trim: true });

    let max_option_key_len = state.max_option_key_len();
    let options = list(
        WidgetId::Options,
        "Options",
        "* ",
        state
            .params
            .iter()
            .map(|(k, v)| {
                let mut s = k.to_string();
                s += ": ";
                for _ in 0..max_option_key_len - k.len() {
                    s.push(' ');
                }
                s += &v.to_string();

                ListItem::new(s)
            })
            .collect(),
    );

    let link = state.link();
    let help = Paragraph::new(format!(
        r#"Find car service shops around you.

Type an address in the search box and hit <Enter>, then pick the matching place. Shops within the search radius are listed nearest first.

Use the arrow keys or jk to move up and down and <TAB> to switch section. Hit <Enter> on an option to edit it, f to toggle the car filter, r to reload.

Esc or Ctrl-C to quit.

Link: {}"#,
        if link.is_empty() { "-" } else { link.as_str() }
    ))
    .block(block(WidgetId::Help, "Help"))
    .wrap(Wrap { trim: true });

    let bounds = match state.locator.center() {
        Some(c) => MapBounds::around(c, state.locator.radius()),
        None => MapBounds::fit(state.locator.shops().iter().map(|s| s.location))
            .unwrap_or(MapBounds::WORLD),
    };

    let selected = state.locator.selected_shop_ix();
    let (mut near, mut far, mut highlighted) = (vec![], vec![], vec![]);
    for (i, shop) in state.locator.shops().iter().enumerate() {
        let p = (shop.location.lng, shop.location.lat);
        if Some(i) == selected {
            highlighted.push(p);
        } else if state.locator.is_visible(i) {
            near.push(p);
        } else {
            far.push(p);
        }
    }

    let center = state.locator.center();
    let area: Vec<_> = center
        .map(|c| geo::ring(c, state.locator.radius(), 128))
        .unwrap_or_default()
        .into_iter()
        .map(|p| (p.lng, p.lat))
        .collect();
    let map = Canvas::default()
        .block(Block::default().title("Map").borders(Borders::ALL))
        .x_bounds([bounds.min_lng, bounds.max_lng])
        .y_bounds([bounds.min_lat, bounds.max_lat])
        .paint(|ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();

            ctx.draw(&Points {
                coords: &far,
                color: Color::Gray,
            });
            ctx.draw(&Points {
                coords: &near,
                color: Color::Cyan,
            });
            ctx.draw(&Points {
                coords: &highlighted,
                color: Color::LightYellow,
            });

            ctx.draw(&Points {
                coords: &area,
                color: Color::Green,
            });

            if let Some(c) = center {
                ctx.print(
                    c.lng,
                    c.lat,
                    Span::styled("@", Style::default().fg(Color::LightGreen)),
                );
            }
        });

    f.render_widget(address_input, left_chunks[0]);
    f.render_stateful_widget(found_places, left_chunks[1], state.places.state());
    if state.filter.is_visible() {
        f.render_stateful_widget(brands, filter_chunks[0], state.filter.brands().state());
        f.render_stateful_widget(models, filter_chunks[1], state.filter.models().state());
    }
    f.render_stateful_widget(shops, left_chunks[3], state.locator.visible().state());

    f.render_widget(map, right_chunks[0]);
    f.render_widget(details, bottom_chunks[0]);

    if state.focus == WidgetId::Options || state.focus == WidgetId::ParamEdit {
        f.render_stateful_widget(options, side_chunks[0], state.params.state());
    } else {
        f.render_widget(options, side_chunks[0]);
    }
    f.render_widget(help, side_chunks[1]);

    if state.focus == WidgetId::ParamEdit {
        let edit_state = match state.parm_edit_state.as_ref() {
            Some(e) => e,
            None => return,
        };

        if let Some((param, _)) = state.params.selected() {
            let parm_edit = Paragraph::new(edit_state.buffer.as_ref())
                .block(block(WidgetId::ParamEdit, param))
                .wrap(Wrap { trim: true })
                .style(if edit_state.is_valid {
                    Style::default()
                } else {
                    Style::default().bg(Color::LightRed)
                });

            let hcentered = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(30),
                    Constraint::Percentage(40),
                    Constraint::Percentage(30),
                ])
                .split(f.size());
            let vcentered = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Percentage(30),
                    Constraint::Max(3),
                    Constraint::Percentage(30),
                ])
                .split(hcentered[1]);

            f.render_widget(Clear, vcentered[1]);
            f.render_widget(parm_edit, vcentered[1]);
        }
    }
}

async fn handle_key_event(
    code: KeyCode,
    state: &mut State,
    state_m: &Arc<Mutex<State>>,
) -> anyhow::Result<()> {
    if state.worker_busy() {
        return Ok(());
    }

    if code == KeyCode::Char('f')
        && !matches!(
            state.focus,
            WidgetId::Search | WidgetId::ParamEdit | WidgetId::Error
        )
    {
        let show = !state.filter.is_visible();
        state.set_param(State::FILTER_OPTION, Box::new(show));
        return Ok(());
    }

    match state.focus {
        WidgetId::Search => match code {
            KeyCode::Enter => {
                if !state.user_address.is_empty() {
                    let user_address = state.user_address.clone();

                    state.fetch(
                        Arc::clone(state_m),
                        async move {
                            shopfinder::geocode(&user_address)
                                .await
                                .map_err(anyhow::Error::msg)
                        },
                        |state, places| {
                            if places.is_empty() {
                                anyhow::bail!("no place found for {:?}", state.user_address);
                            }
                            state.places = WrappingList::new(places);
                            state.focus = WidgetId::Places;
                            Ok(())
                        },
                    );
                }
            }
            code => {
                if edit_string(&mut state.user_address, code) {
                    state.places = WrappingList::new(vec![]);
                }
            }
        },
        WidgetId::Places => match code {
            KeyCode::Up | KeyCode::Char('k') => {
                state.places.up();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                state.places.down();
            }
            KeyCode::Enter => {
                if let Some(place) = state.places.selected() {
                    match place.location() {
                        Ok(at) => {
                            tracing::info!(place = %place.display_name, "user located");
                            state.set_param(State::LOCATION_OPTION, Box::new(Location(Some(at))));
                            state.focus = WidgetId::Shops;
                        }
                        Err(e) => state.fail(e.into()),
                    }
                }
            }
            _ => {}
        },
        WidgetId::Brands => match code {
            KeyCode::Up | KeyCode::Char('k') => {
                state.filter.brands().up();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                state.filter.brands().down();
            }
            KeyCode::Enter => {
                if state.filter.select_brand().is_some() {
                    state.focus = WidgetId::Models;
                }
            }
            _ => {}
        },
        WidgetId::Models => match code {
            KeyCode::Up | KeyCode::Char('k') => {
                state.filter.models().up();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                state.filter.models().down();
            }
            KeyCode::Enter => {
                state.filter.select_model();
            }
            _ => {}
        },
        WidgetId::Shops => match code {
            KeyCode::Up | KeyCode::Char('k') => {
                state.locator.up();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                state.locator.down();
            }
            KeyCode::Enter => {
                if state.locator.open_details().is_some() {
                    state.focus = WidgetId::Details;
                }
            }
            KeyCode::Char('r') => {
                state.load(Arc::clone(state_m));
            }
            _ => {}
        },
        WidgetId::Details => match code {
            KeyCode::Esc | KeyCode::Backspace => {
                state.locator.close_details();
                state.focus = WidgetId::Shops;
            }
            KeyCode::Char('o') => {
                if let Some(details) = state.locator.details() {
                    let link = shopfinder::osm_link(details.shop.location);
                    if let Err(e) = opener::open(&link) {
                        state.fail(e.into());
                    }
                }
            }
            KeyCode::Char('c') => {
                if let Some(details) = state.locator.details() {
                    let link = shopfinder::tel_link(&details.shop.phone);
                    if let Err(e) = opener::open(&link) {
                        state.fail(e.into());
                    }
                }
            }
            _ => {}
        },
        WidgetId::Options => match code {
            KeyCode::Up | KeyCode::Char('k') => {
                state.params.up();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                state.params.down();
            }
            KeyCode::Enter => {
                if let Some((_param, value)) = state.params.selected() {
                    state.parm_edit_state = Some(ParmEditState::new(value.cloned()));
                    state.focus = WidgetId::ParamEdit;
                }
            }
            _ => {}
        },
        WidgetId::ParamEdit => match code {
            KeyCode::Enter => {
                if let Some(edit_state) = state.parm_edit_state.take() {
                    if edit_state.is_valid {
                        state.focus = WidgetId::Options;
                        state.set_current_param(edit_state.value);
                    } else {
                        state.parm_edit_state = Some(edit_state);
                    }
                }
            }
            KeyCode::Esc => {
                state.parm_edit_state = None;
                state.focus = WidgetId::Options;
            }
            _ => {
                if let Some(edit_state) = state.parm_edit_state.as_mut() {
                    edit_string(&mut edit_state.buffer, code);

                    edit_state.is_valid = edit_state.value.from_str(&edit_state.buffer);
                }
            }
        },
        WidgetId::Help => {}
        WidgetId::Error => {
            if code == KeyCode::Enter {
                state.worker_state = WorkerState::Idle;
                state.focus = WidgetId::Search;
            }
        }
    }

    Ok(())
}

fn edit_string(s: &mut String, code: KeyCode) -> bool {
    match code {
        KeyCode::Backspace => {
            s.pop();
            true
        }
        KeyCode::Char(c) => {
            s.push(c);
            true
        }
        _ => false,
    }
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let file = fs::File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(anyhow::Error::msg)?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log {
        init_logging(path)?;
    }

    let view = cli.state.unwrap_or_default();
    let at = cli.at.or(view.at);
    let radius = cli.radius.or(view.radius).unwrap_or_default();
    let api = Api::new(cli.api)?;
    tracing::info!(api = %api.base(), ?at, %radius, "starting");

    let state = State::new(api, at, radius, view.shop);

    crossterm::terminal::enable_raw_mode()?;

    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.clear()?;

    let runtime = Runtime::new()?;
    let res = runtime.block_on(main_loop(&mut terminal, state));

    terminal.clear()?;
    crossterm::terminal::disable_raw_mode()?;

    let link = res?;
    if !link.is_empty() {
        tracing::info!(%link, "exiting");
        println!("{link}");
    }

    Ok(())
}
