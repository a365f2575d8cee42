//! Human-readable report rendering.

use console::style;
use rotular::{AnalyzedElement, ComplianceReport};

/// Print the report in the readable text layout.
pub fn print_report(report: &ComplianceReport) {
    println!("\n=== WCAG 2.4.6 Compliance Report ===");
    println!("URL: {}", report.url);
    println!("\nTotal elements: {}", report.total_elements);
    println!("Headings: {}", report.total_headings);
    println!("Labels: {}", report.total_labels);
    println!(
        "\nDescriptive elements: {}",
        style(report.descriptive_elements).green()
    );
    println!(
        "Elements needing improvement: {}",
        style(report.non_descriptive_elements).red()
    );

    let verdict = if report.wcag_2_4_6_compliant {
        style("compliant").green().bold()
    } else {
        style("non-compliant").red().bold()
    };
    println!("\nWCAG 2.4.6 status: {verdict}");

    println!("\n=== Element details ===");
    for element in &report.descriptive_elements_details {
        print_element(element);
    }
    for element in &report.non_descriptive_elements_details {
        print_element(element);
    }
}

fn print_element(element: &AnalyzedElement) {
    println!("\nElement type: {}", element.element_type);
    let status = if element.descriptive {
        style("no improvement needed").green()
    } else {
        style("improvement needed").red()
    };
    println!("Status: {status}");
    println!("Text: {}", element.text);
    println!("XPath: {}", element.locator);
    println!("Evaluation: {}", element.evaluation);
    if !element.recommendations.is_empty() {
        println!("Recommendations:");
        for rec in &element.recommendations {
            println!("- {rec}");
        }
    }
}
