//! Terminal rendering for cart snapshots.

use std::io;

use tabled::builder::Builder;
use tabled::grid::config::HorizontalLine;
use tabled::settings::object::{Columns, Rows};
use tabled::settings::{Alignment, Color, Style, Theme};

use samagri::totals::CartTotals;
use samagri_client::cart::CartView;

/// Formats an amount of minor units as Nepalese rupees.
pub(crate) fn rupees(amount: u64) -> String {
    format!("NPR {}.{:02}", amount / 100, amount % 100)
}

/// Writes a cart and its totals as a table.
pub(crate) fn write_cart(out: &mut impl io::Write, view: &CartView) -> io::Result<()> {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Unit Price", "Qty", "Line Total"]);

    for line in view.cart.items() {
        builder.push_record([
            line.item().to_string(),
            rupees(line.unit_price()),
            line.quantity().to_string(),
            rupees(line.line_total().unwrap_or_default()),
        ]);
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(1..4), Alignment::right());

    writeln!(out, "{table}")?;

    write_totals(out, &view.totals)
}

fn write_totals(out: &mut impl io::Write, totals: &CartTotals) -> io::Result<()> {
    let subtotal = rupees(totals.subtotal);
    let discount = rupees(totals.discount);
    let grand_total = rupees(totals.grand_total);

    let width = subtotal
        .len()
        .max(discount.len())
        .max(grand_total.len());

    writeln!(out, " Subtotal:     {subtotal:>width$}")?;
    writeln!(out, " Discount:     {discount:>width$}")?;
    writeln!(out, " Grand total:  {grand_total:>width$}")
}
