/*!

This is the long-form manual for `survey_weights` and `surveytab`.

## Tables

A table holds one row per respondent. Each row has one answer per
categorical column and, for weighted tables, a sample weight. The raw cells
are read as follows:

* an empty cell is a blank answer
* the cell `.` marks a question that was not answered or did not apply
* anything else is an answer

Blank and `.` answers are never counted as categories. They still belong to
the population: their weight is part of the denominator of
[`weighted_percentage`](crate::weighted_percentage). Use
[`weighted_percentage_of_valid`](crate::weighted_percentage_of_valid) to
only consider the respondents that answered.

## Command line

`surveytab` reads a dashboard description in JSON format:

```json
{
  "outputSettings": { "dashboardName": "Pesquisa de Opinião - Sergipe" },
  "dataSource": {
    "provider": "csv",
    "filePath": "respostas.csv",
    "delimiter": ";",
    "weightColumn": "peso"
  },
  "filterAttributes": ["cidade", "região", "sexo"],
  "filters": { "sexo": ["F"] },
  "columnGroups": { "programas": ["programa: mão amiga", "programa: cnh social"] },
  "views": [
    {
      "id": "demografico",
      "title": "Demográfico",
      "panels": [
        { "kind": "distribution", "title": "Top 10 Cidades", "column": "cidade", "top": 10 }
      ]
    }
  ]
}
```

### Data sources

* `csv` delimited text. The delimiter defaults to `;`.
* `xlsx` Excel spreadsheet. The first worksheet is used unless
  `excelWorksheetName` is given. Dates are read as `YYYY-MM-DD` and error
  cells such as `#N/A` as blank answers.

The first row holds the column names. The weight column (default `weight`)
accepts both `.` and `,` as decimal separator. A dataset without the weight
column is tabulated unweighted.

### Panels

| kind               | fields                                        | engine function                 |
|--------------------|-----------------------------------------------|---------------------------------|
| `distribution`     | `column`, `top`?                              | `weighted_percentage`, `top_n`  |
| `validShare`       | `columns` or `group`, `labelBy`?, `stripPrefix`? | `weighted_percentage_of_valid` |
| `positiveShare`    | `columns` or `group`, `positive`, `stripPrefix`? | `positive_share`             |
| `awareness`        | `columns` or `group`, `yes`, `no`, `limit`?   | `awareness_split`               |
| `awarenessRanking` | `columns` or `group`, `yes`, `no`, `top`?     | `awareness_ranking`, `top_n`    |
| `crosstab`         | `rowColumn`, `colColumn`, `select`?           | `weighted_crosstab`             |

A panel that has nothing to show is reported with the status
`insufficientData`.

*/
