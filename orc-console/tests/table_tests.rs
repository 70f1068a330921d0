//! Table view: filtering, sorting, pagination, export and message drafts

mod helpers;

use orc_console::table::{
    EmptyReason, ExportColumn, MessageTarget, SortColumn, SortDirection, TableView, PAGE_SIZE,
};
use orc_console::PaperRow;
use serde_json::json;

fn many_rows(template: &PaperRow, count: u64) -> Vec<PaperRow> {
    (1..=count)
        .map(|n| {
            let mut row = template.clone();
            row.number = n;
            row.id = format!("p{}", n);
            row.title = format!("Paper {}", n);
            row
        })
        .collect()
}

#[tokio::test]
async fn test_export_ignores_pagination_and_keeps_order() {
    let (venue, data) = helpers::console_data().await;
    let mut view = TableView::new(&venue);
    view.set_filter("+reviewsDone<1").unwrap();
    view.set_page(7);

    let columns = ExportColumn::parse_list("number,title").unwrap();
    let table = view.export(&data.rows, &columns);

    assert_eq!(table.columns, vec!["number", "title"]);
    assert_eq!(
        table.rows,
        vec![
            vec![json!(2), json!("Graph Methods")],
            vec![json!(3), json!("Unassigned Work")],
        ]
    );
}

#[tokio::test]
async fn test_export_confidence_range_columns() {
    let (venue, data) = helpers::console_data().await;
    let view = TableView::new(&venue);

    let columns = ExportColumn::parse_list("number,confidence_min,confidence_avg,confidence_max").unwrap();
    let table = view.export(&data.rows, &columns);

    assert_eq!(table.rows[0], vec![json!(1), json!(3.0), json!(3.5), json!(4.0)]);
    assert_eq!(table.rows[1], vec![json!(2), json!("N/A"), json!("N/A"), json!("N/A")]);
}

#[tokio::test]
async fn test_export_covers_every_page() {
    let (venue, data) = helpers::console_data().await;
    let rows = many_rows(&data.rows[0], PAGE_SIZE as u64 + 5);
    let mut view = TableView::new(&venue);
    view.set_page(2);

    let page = view.render(&rows);
    assert_eq!(page.rows.len(), 5);
    assert_eq!(page.pagination.total_pages, 2);

    let table = view.export(&rows, &ExportColumn::parse_list("number").unwrap());
    assert_eq!(table.rows.len(), PAGE_SIZE + 5);
    assert_eq!(table.to_tsv().lines().count(), PAGE_SIZE + 6);
}

#[tokio::test]
async fn test_filter_and_sort_changes_return_to_first_page() {
    let (venue, data) = helpers::console_data().await;
    let rows = many_rows(&data.rows[0], 60);
    let mut view = TableView::new(&venue);

    view.set_page(3);
    assert_eq!(view.render(&rows).pagination.page, 3);

    view.set_filter("Paper").unwrap();
    assert_eq!(view.page(), 1);

    view.set_page(2);
    view.set_sort(SortColumn::Title, SortDirection::Desc);
    assert_eq!(view.page(), 1);

    view.set_page(2);
    view.toggle_sort(SortColumn::Title);
    assert_eq!(view.page(), 1);
    assert_eq!(view.sort().1, SortDirection::Asc);
}

#[test]
fn test_new_sort_column_starts_in_configured_direction() {
    let mut venue = helpers::venue();
    venue.default_sort_desc = true;
    let mut view = TableView::new(&venue);
    assert_eq!(view.sort().1, SortDirection::Desc);

    view.toggle_sort(SortColumn::Title);
    assert_eq!(view.sort(), (&SortColumn::Title, SortDirection::Desc));

    view.toggle_sort(SortColumn::Title);
    assert_eq!(view.sort().1, SortDirection::Asc);

    view.toggle_sort(SortColumn::Number);
    assert_eq!(view.sort(), (&SortColumn::Number, SortDirection::Desc));
}

#[tokio::test]
async fn test_invalid_filter_keeps_previous_filter() {
    let (venue, data) = helpers::console_data().await;
    let mut view = TableView::new(&venue);
    view.set_filter("Graph").unwrap();

    assert!(view.set_filter("+bogus=1").is_err());
    assert_eq!(view.filter_text(), "Graph");
    assert_eq!(view.render(&data.rows).matching_rows, 1);
}

#[tokio::test]
async fn test_empty_table_messages() {
    let (venue, data) = helpers::console_data().await;
    let mut view = TableView::new(&venue);

    let page = view.render(&[]);
    assert_eq!(page.empty, Some(EmptyReason::NoPapersSubmitted));
    assert_eq!(page.empty_message, Some("No papers have been submitted"));

    view.set_filter("no such title anywhere").unwrap();
    let page = view.render(&data.rows);
    assert_eq!(page.empty, Some(EmptyReason::NoMatchingPapers));
    assert_eq!(page.empty_message, Some("No papers matching search criteria"));
    assert_eq!(page.total_rows, 3);
}

#[tokio::test]
async fn test_rating_filter_skips_missing_values() {
    let (venue, data) = helpers::console_data().await;
    let mut view = TableView::new(&venue);

    view.set_filter("+ratingAvg>=0").unwrap();
    let numbers: Vec<u64> = view.visible(&data.rows).iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![1]);

    view.set_filter("+ratingAvg<100").unwrap();
    let numbers: Vec<u64> = view.visible(&data.rows).iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![1]);
}

#[tokio::test]
async fn test_missing_ratings_sort_last_in_both_directions() {
    let (venue, data) = helpers::console_data().await;
    let mut view = TableView::new(&venue);
    let column: SortColumn = "rating_avg".parse().unwrap();

    view.set_sort(column.clone(), SortDirection::Desc);
    let numbers: Vec<u64> = view.visible(&data.rows).iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    view.set_sort(column, SortDirection::Asc);
    let numbers: Vec<u64> = view.visible(&data.rows).iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_sort_by_title_descending() {
    let (venue, data) = helpers::console_data().await;
    let mut view = TableView::new(&venue);
    view.set_sort(SortColumn::Title, SortDirection::Desc);

    let titles: Vec<&str> = view
        .render(&data.rows)
        .rows
        .iter()
        .map(|r| r.title.as_str())
        .collect();
    assert_eq!(
        titles,
        vec!["Unassigned Work", "Graph Methods", "Attention Everywhere"]
    );
}

#[tokio::test]
async fn test_message_draft_for_reviewers_missing_reviews() {
    let (venue, data) = helpers::console_data().await;
    let mut view = TableView::new(&venue);
    view.selection.select("p1");
    view.selection.select("p2");
    view.selection.select("p99");

    let draft = view.message_draft(
        &data.rows,
        MessageTarget::ReviewersMissingReviews,
        "Reminder",
        "Please submit your review.",
    );
    let recipients: Vec<(&str, &[u64])> = draft
        .recipients
        .iter()
        .map(|r| (r.member_id.as_str(), r.paper_numbers.as_slice()))
        .collect();
    assert_eq!(
        recipients,
        vec![("~Ann_One1", &[2u64][..]), ("~Dan_Four1", &[2u64][..])]
    );
    assert_eq!(draft.subject, "Reminder");
}

#[tokio::test]
async fn test_selection_survives_filter_changes() {
    let (venue, data) = helpers::console_data().await;
    let mut view = TableView::new(&venue);
    view.selection.select("p1");
    view.set_filter("Graph").unwrap();

    let draft = view.message_draft(&data.rows, MessageTarget::AllReviewers, "", "");
    let ids: Vec<&str> = draft.recipients.iter().map(|r| r.member_id.as_str()).collect();
    assert_eq!(ids, vec!["~Ann_One1", "~Bob_Two1"]);
}
