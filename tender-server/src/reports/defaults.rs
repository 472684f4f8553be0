//! Built-in statutory templates
//!
//! Written into the templates directory on startup when absent, so a
//! fresh install can generate documents immediately while still letting
//! the office drop in customized versions. Existing files are never
//! overwritten.

use std::fs;
use std::path::Path;
use tender_common::Result;
use tracing::info;

const COMPARATIVE_STATEMENT: &str = r#"\documentclass[12pt,a4paper]{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage{geometry}
\usepackage{array}
\usepackage{longtable}
\usepackage{booktabs}

\geometry{margin=2cm}

\begin{document}

\begin{center}
\textbf{{{office_header}}}\\[0.3cm]
\textbf{COMPARATIVE STATEMENT OF TENDERS}\\[0.2cm]
\end{center}

\vspace{0.5cm}

\noindent
\textbf{NIT No.:} {{nit_number}} \hfill \textbf{Date:} {{current_date}}\\
\textbf{Work:} {{work_name}}\\
\textbf{Estimated Cost:} Rs. {{estimated_cost}}\\
\textbf{Earnest Money:} Rs. {{earnest_money}}\\
\textbf{Time of Completion:} {{time_of_completion}} months

\vspace{0.5cm}

\begin{longtable}{|c|p{4cm}|c|c|c|}
\hline
\textbf{S.No.} & \textbf{Name of Bidder} & \textbf{Estimated Cost} & \textbf{Percentage} & \textbf{Bid Amount} \\
\hline
{{bidder_table_rows}}
\hline
\end{longtable}

\vspace{0.5cm}

\noindent
\textbf{Lowest Bidder:} {{lowest_bidder_name}}\\
\textbf{Lowest Amount:} Rs. {{lowest_bidder_amount}} ({{lowest_bidder_percentage_display}})\\
\textbf{Amount in Words:} {{lowest_bidder_amount_words}}

\vspace{1cm}

\noindent
\textbf{{{ee_name}}}\\
\textbf{Executive Engineer}

\end{document}
"#;

const LETTER_OF_ACCEPTANCE: &str = r#"\documentclass[12pt,a4paper]{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage{geometry}

\geometry{margin=2.5cm}

\begin{document}

\begin{center}
\textbf{{{office_header}}}\\[0.3cm]
\textbf{LETTER OF ACCEPTANCE}\\[0.2cm]
\end{center}

\vspace{0.5cm}

\noindent
\textbf{NIT No.:} {{nit_number}} \hfill \textbf{Date:} {{current_date}}

\vspace{0.5cm}

\noindent
To,\\
{{lowest_bidder_name}}

\vspace{0.5cm}

\noindent
Subject: Acceptance of tender for ``{{work_name}}''

\vspace{0.5cm}

\noindent
Dear Sir/Madam,

Your tender dated {{tender_date}} for the above work, quoted at
{{lowest_bidder_percentage_display}} the estimated cost of
Rs. {{estimated_cost}}, amounting to Rs. {{lowest_bidder_amount}}
({{lowest_bidder_amount_words}}), is hereby accepted.

The work shall be completed within {{time_of_completion}} months from
the date of issue of the work order. The earnest money of
Rs. {{earnest_money}} deposited with the tender shall be retained as
part of the security deposit.

\vspace{1.5cm}

\noindent
\textbf{{{ee_name}}}\\
\textbf{Executive Engineer}

\end{document}
"#;

const SCRUTINY_SHEET: &str = r#"\documentclass[12pt,a4paper]{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage{geometry}
\usepackage{array}
\usepackage{longtable}

\geometry{margin=2cm}

\begin{document}

\begin{center}
\textbf{{{office_header}}}\\[0.3cm]
\textbf{SCRUTINY SHEET OF TENDERS}\\[0.2cm]
\end{center}

\vspace{0.5cm}

\noindent
\begin{tabular}{|p{6cm}|p{8cm}|}
\hline
NIT No. \& Date & {{nit_number}} dated {{tender_date}} \\
\hline
Name of Work & {{work_name}} \\
\hline
Estimated Cost & Rs. {{estimated_cost}} \\
\hline
Schedule Amount & Rs. {{schedule_amount}} \\
\hline
Earnest Money & Rs. {{earnest_money}} \\
\hline
Time of Completion & {{time_of_completion}} months \\
\hline
Number of Tenders Received & {{total_bidders}} \\
\hline
Contingencies & {{contingencies_note}} \\
\hline
\end{tabular}

\vspace{0.5cm}

\begin{longtable}{|c|p{4cm}|c|c|c|}
\hline
\textbf{S.No.} & \textbf{Name of Bidder} & \textbf{Estimated Cost} & \textbf{Percentage} & \textbf{Bid Amount} \\
\hline
{{bidder_table_rows}}
\hline
\end{longtable}

\vspace{0.5cm}

\noindent
The lowest tender of {{lowest_bidder_name}} at
{{lowest_bidder_percentage_display}}, amounting to
Rs. {{lowest_bidder_amount}}, is recommended for acceptance.

\vspace{1.5cm}

\noindent
\textbf{{{ee_name}}}\\
\textbf{Executive Engineer}

\end{document}
"#;

const WORK_ORDER: &str = r#"\documentclass[12pt,a4paper]{article}
\usepackage[utf8]{inputenc}
\usepackage[T1]{fontenc}
\usepackage{geometry}

\geometry{margin=2.5cm}

\begin{document}

\begin{center}
\textbf{{{office_header}}}\\[0.3cm]
\textbf{WORK ORDER}\\[0.2cm]
\end{center}

\vspace{0.5cm}

\noindent
\textbf{NIT No.:} {{nit_number}} \hfill \textbf{Date:} {{current_date}}

\vspace{0.5cm}

\noindent
To,\\
{{lowest_bidder_name}}

\vspace{0.5cm}

\noindent
You are hereby directed to commence the work ``{{work_name}}'' at your
accepted rate of {{lowest_bidder_percentage_display}} the estimated
cost, for a contract amount of Rs. {{lowest_bidder_amount}}
({{lowest_bidder_amount_words}}).

\vspace{0.3cm}

\noindent
The work shall be completed within {{time_of_completion}} months from
the date of this order. Time is the essence of the contract.

\vspace{1.5cm}

\noindent
\textbf{{{ee_name}}}\\
\textbf{Executive Engineer}

\end{document}
"#;

/// (template file name, content) for every statutory document
pub const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("comparative_statement.tex", COMPARATIVE_STATEMENT),
    ("letter_of_acceptance.tex", LETTER_OF_ACCEPTANCE),
    ("scrutiny_sheet.tex", SCRUTINY_SHEET),
    ("work_order.tex", WORK_ORDER),
];

/// Write any missing default templates into the templates directory.
pub fn ensure_default_templates(templates_dir: &Path) -> Result<()> {
    fs::create_dir_all(templates_dir)?;

    for (name, content) in DEFAULT_TEMPLATES {
        let path = templates_dir.join(name);
        if !path.exists() {
            fs::write(&path, content)?;
            info!("Created default template: {}", name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_missing_templates_only() {
        let dir = TempDir::new().unwrap();
        ensure_default_templates(dir.path()).unwrap();

        for (name, _) in DEFAULT_TEMPLATES {
            assert!(dir.path().join(name).exists());
        }

        // A customized template survives a second pass
        let custom = dir.path().join("work_order.tex");
        fs::write(&custom, "customized").unwrap();
        ensure_default_templates(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&custom).unwrap(), "customized");
    }

    #[test]
    fn default_templates_use_known_placeholders() {
        // Every placeholder in the shipped templates must be produced by
        // the context builder, or rendering would always fail
        let known = [
            "office_header",
            "nit_number",
            "work_name",
            "estimated_cost",
            "schedule_amount",
            "earnest_money",
            "time_of_completion",
            "current_date",
            "tender_date",
            "total_bidders",
            "bidder_table_rows",
            "lowest_bidder_name",
            "lowest_bidder_amount",
            "lowest_bidder_amount_words",
            "lowest_bidder_percentage_display",
            "contingencies_note",
            "ee_name",
        ];
        let re = regex::Regex::new(r"\{\{([a-z0-9_]+)\}\}").unwrap();
        for (name, content) in DEFAULT_TEMPLATES {
            for caps in re.captures_iter(content) {
                assert!(
                    known.contains(&&caps[1]),
                    "template {} uses unknown placeholder {}",
                    name,
                    &caps[1]
                );
            }
        }
    }
}
