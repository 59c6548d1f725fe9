/*!

This is the long-form manual for `election_sentiment` and `tweetmap`.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values with a header row
* `xlsx` Excel workbooks, with the header in the first row of the worksheet

### Columns

The columns are found by name in the header. Their order does not matter and
extra columns are ignored.

| column                | content                                          | required |
|-----------------------|--------------------------------------------------|----------|
| `tweet_id`            | identifier of the tweet                          | yes      |
| `created_at`          | creation time of the tweet                       | yes      |
| `candidate`           | the candidate the tweet is about                 | yes      |
| `state_code`          | two-letter code of the US state                  | yes      |
| `sentiment_vader`     | sentiment label (`positive`, `negative`, ...)    | yes      |
| `likes`               | number of likes                                  | yes      |
| `retweet_count`       | number of retweets                               | yes      |
| `weighted_sentiment`  | sentiment score, weighted upstream               | yes      |
| `sentiment_score`     | raw sentiment score                              | yes      |
| `lat`, `long`         | coordinates of the tweet                         | yes      |
| `representative_word` | topic of the tweet                               | no       |

The name of the sentiment label column can be changed with the
`sentimentColumn` option of the configuration file.

Empty cells are accepted everywhere except in `created_at`. Empty candidates
and states are never offered in the filters. Empty likes, retweets and weighted
sentiments count as zero in the totals. For the derived fields below, an empty
like or retweet count makes the engagement unknown, and an empty weighted
sentiment makes the normalized sentiment unknown.

The creation time may be written as `2020-10-15 08:30:00`, with an optional
fraction of seconds and an optional UTC offset, in RFC 3339, or as a bare date.
The calendar day used for grouping is the one written in the file: offsets are
not converted.

## Derived fields

Once the table is loaded, each tweet gets:
* `engagement`: likes plus retweets, unknown if either is empty
* `normalized_sentiment`: the weighted sentiment divided by the engagement,
  or zero if the engagement is zero or unknown. It is unknown if the engagement
  is positive and the weighted sentiment is empty. Unknown values are left out
  of the daily mean of each state, which is `null` when all of them are unknown.
* `preferred_candidate`: the preferred candidate of its state

The preferred candidate of a state is computed once over the whole dataset,
regardless of the filters. The weighted sentiments of each of the two
candidates are summed within the state, and the first candidate is selected
only if its sum is strictly greater. Otherwise, including on a tie or when
neither candidate has tweets in that state, the second candidate is selected.

## Filters

* candidates: any subset of the candidates
* sentiment: exactly one sentiment label
* states: any subset of the states
* dates: an inclusive range of days

When nothing matches the selection, no aggregation is run and the result is
reported with the status `noData`.

## Output

The command line writes a JSON document with four sections:
* `overview`: totals over the whole dataset, and the most frequent topic
* `filters`: the values that can be selected
* `selection`: the selection that was applied
* `result`: the per-state per-day summaries (`stateDays`), the same rows
  grouped into animation frames (`frames`) and the per-day `timeline`

## Configuration

A configuration file can be passed with `--config`:

```json
{
  "inputSource": {
    "provider": "csv",
    "filePath": "tweets.csv",
    "sentimentColumn": "sentiment_vader"
  },
  "candidates": { "first": "Joe Biden", "second": "Donald Trump" },
  "filters": { "sentiment": "positive", "states": ["OH", "PA"] },
  "outputSettings": { "country": "USA", "outputPath": "stdout" }
}
```

The file path is relative to the location of the configuration file. The
options given on the command line take precedence.

## Interactive mode

With `--interactive`, `tweetmap` loads the dataset once, then reads one
selection per line on the standard input (same fields as the `filters` section
above) and answers with one line of JSON per selection. The dataset is loaded
again if the input file is modified between two selections.

*/
