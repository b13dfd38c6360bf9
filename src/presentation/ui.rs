use crate::application::{
    App, AppMode, FilterColumn, FormController, NotificationLevel, Screen, TableController,
};
use crate::domain::Field;
use crate::infrastructure::SlotBackend;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

pub fn render_ui<B: SlotBackend>(f: &mut Frame, app: &App<B>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    match &app.screen {
        Screen::Listing(table) => render_listing(f, app, table, chunks[1]),
        Screen::Form(form) => render_form(f, form, chunks[1]),
    }
    render_status_bar(f, app, chunks[2]);

    if app.mode == AppMode::ConfirmDelete {
        if let Some(table) = app.table() {
            render_confirm_popup(f, table);
        }
    }
}

fn render_header<B: SlotBackend>(f: &mut Frame, app: &App<B>, area: Rect) {
    let header = Paragraph::new(format!("cepbook - Address Book | {}", app.route.path()))
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn render_listing<B: SlotBackend>(f: &mut Frame, app: &App<B>, table: &TableController, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_filters(f, app, table, chunks[0]);

    let visible = table.visible();
    if visible.is_empty() {
        let empty = Paragraph::new("No addresses found.")
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL).title("Saved addresses"));
        f.render_widget(empty, chunks[1]);
        return;
    }

    let header = Row::new(
        ["ID", "Name", "Address", "CEP", "Street", "District", "City", "State"]
            .into_iter()
            .map(|title| Cell::from(title).style(Style::default().fg(Color::Yellow))),
    )
    .height(1);

    let rows = visible.iter().enumerate().map(|(row, (_, record))| {
        let style = if row == table.selected {
            Style::default().bg(Color::Blue).fg(Color::White)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(record.id.to_string()),
            Cell::from(record.name.as_str()),
            Cell::from(record.address_name.as_str()),
            Cell::from(record.cep.as_str()),
            Cell::from(record.logradouro.as_str()),
            Cell::from(record.bairro.as_str()),
            Cell::from(record.localidade.as_str()),
            Cell::from(record.uf.as_str()),
        ])
        .style(style)
        .height(1)
    });

    let widths = [
        Constraint::Length(4),
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Length(9),
        Constraint::Fill(3),
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Length(5),
    ];
    let widget = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Saved addresses"))
        .column_spacing(1);

    f.render_widget(widget, chunks[1]);
}

fn render_filters<B: SlotBackend>(f: &mut Frame, app: &App<B>, table: &TableController, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (column, chunk) in FilterColumn::ALL.into_iter().zip(chunks.iter()) {
        let active = app.mode == AppMode::Filter(column);
        let border = if active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let filter = Paragraph::new(table.filters.get(column).to_string()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(format!("Filter by {}", column.label())),
        );
        f.render_widget(filter, *chunk);
    }
}

fn render_form(f: &mut Frame, form: &FormController, area: Rect) {
    let title = match form.bound_id() {
        Some(id) => format!("Edit address {id}"),
        None => "New address".to_string(),
    };
    let outer = Block::default().borders(Borders::ALL).title(title);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3); 7])
        .split(inner);

    for (field, chunk) in Field::ALL.into_iter().zip(chunks.iter()) {
        let mut label = field.label().to_string();
        if field == Field::Cep && form.is_lookup_pending() {
            label.push_str(" (searching...)");
        }
        let (text_style, border_style) = if !field.is_editable() {
            (Style::default().fg(Color::DarkGray), Style::default().fg(Color::DarkGray))
        } else if field == form.focus {
            (Style::default().add_modifier(Modifier::BOLD), Style::default().fg(Color::Yellow))
        } else {
            (Style::default(), Style::default())
        };
        let input = Paragraph::new(form.draft.get(field).to_string())
            .style(text_style)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(label),
            );
        f.render_widget(input, *chunk);
    }
}

fn render_status_bar<B: SlotBackend>(f: &mut Frame, app: &App<B>, area: Rect) {
    let (text, style) = match &app.notification {
        Some(note) => {
            let color = match note.level {
                NotificationLevel::Success => Color::Green,
                NotificationLevel::Error => Color::Red,
            };
            (note.message.clone(), Style::default().fg(color))
        }
        None => (hint_text(app.mode).to_string(), Style::default()),
    };

    let status = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(style);
    f.render_widget(status, area);
}

fn hint_text(mode: AppMode) -> &'static str {
    match mode {
        AppMode::Browse => "↑↓/jk: select | a: add | Enter/e: edit | d: delete | /: filter | q: quit",
        AppMode::Filter(_) => "Type to filter | Tab: next column | Enter/Esc: done",
        AppMode::ConfirmDelete => "y: delete | n/Esc: keep",
        AppMode::Form => "Tab/↑↓: next field | Ctrl+L/F3: look up CEP | Enter: save | Esc: back",
    }
}

fn render_confirm_popup(f: &mut Frame, table: &TableController) {
    let Some(record) = table.pending_delete() else {
        return;
    };
    let area = f.area();
    // Short terminals get a clipped popup rather than one past the frame.
    let popup_area = Rect {
        x: area.width / 4,
        y: area.height / 3,
        width: area.width / 2,
        height: 5,
    }
    .intersection(area);

    f.render_widget(Clear, popup_area);
    let prompt = Paragraph::new(format!(
        "Delete \"{}\" ({})?\n\ny: delete    n: keep",
        record.address_name, record.name
    ))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Confirm")
            .style(Style::default().fg(Color::Red)),
    );
    f.render_widget(prompt, popup_area);
}
