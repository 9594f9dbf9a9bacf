/*!

This is the long-form manual for `district_features` and `elexprep`.

## Data directory

All the files live in one flat data directory (`data/` by default). The
directory must exist before the first run. A file that is already present is
never downloaded again unless `--force-refresh` is given, so the directory
is also the cache.

| file | source |
|------|--------|
| `census-by-congress_<year><group>.csv` | census API, one file per ACS profile group |
| `parsed_census-by-congress_<year>.csv` | census field mapper |
| `1976-2018-house2.csv` | historical house results |
| `2020-house.csv` | scraped 2020 house results |
| `exitpolls_<key>.json` | CNN exit polls (`2012h`, `2016p`, ...) |
| `parsed_exitpolls_<key>.csv` | exit-poll normalizer |
| `final_data_<year>h.csv` | join of one house cycle |
| `features_house.csv` | all the cycles in the final schema |
| `house_changes.csv` | winning party of every district, per cycle |

## Census fields

The census codes of the profile tables move from one year to the next. Each
year has its own table in the configuration (see
[census_fields](crate::census_fields)), mapping codes to stable names:

* `voteage_pop`, `voteage_m`, `voteage_f`: citizens of voting age (2016 and
  later). Older years have `allage_m`, `allage_f` and `allage_citzenpct`
  instead.
* `race_pop`, `race_white`, `race_black`, `race_asian`, `race_hisp`
* `ed_pop`, `ed_ba`, `ed_grdeg`: population of 25 years and over,
  bachelor's degree, graduate degree
* `age_pop`, `age_20_24` ... `age_60_64`, `age_18_plus`, `age_21_plus`,
  `age_65_plus`
* `inc_pop`, `inc_less_10` ... `inc_200_plus`: households by income

Adding a year only requires a new table.

## Exit polls

Two JSON layouts are understood:

### `polls`

Up to 2018. Each poll carries its own candidates, identified either by a
`fname` of `Democrat` / `Republican` or by a party of `D` / `R`.
The 2012 and 2014 files are served as JSONP (`callback_0({...})`).

### `questions`

From 2020. The candidates are listed once for the whole file, with a
`partyName` of `Democratic` or `Republican`.

Each (question, answer) line becomes the summed percentages of the democrat,
republican and other candidates. The join keeps the difference
`dem - rep` for an allow-list of demographic columns.

## Final schema

Up to 2018 the exit polls use narrower buckets than the ones of the final
schema (for example `Age_18-29` and `Age_30-39` for `18-34`). They are
averaged with the census population of each bucket in the district as
weights, see [weighted_percentage](crate::normalize::weighted_percentage).
The 2020 poll already uses the final buckets.

The census counts are re-bucketed the same way for every year:

* `age_18_34 = age_20_24 + age_25_34 + 2/3 * (ages 18 to 20)`
* `age_35_49 = age_35_44 + age_45_54 / 2`
* `inc_50_100 = inc_50_74 + inc_75_99`
* `ed_4yr = ed_ba + ed_grdeg`

Before writing `features_house.csv`, every cycle is checked against the final
schema. A census table that cannot produce all the columns stops the run and
the missing columns are printed as a diff.

## Known gaps

The districts of `DC` and `PR` have no vote record in several years. They get
zero votes without a warning. Other seats without results (uncontested races
for example) get zero votes and a warning.

## Configuration

All the source addresses can be overridden with a JSON file passed to
`--config`:

```json
{
  "dataDir": "data/",
  "pacingMillis": 1000,
  "censusApiBase": "https://api.census.gov/data",
  "exitPolls": {
    "2020h": "https://politics-elex-results.data.api.cnn.io/results/exit-poll/2020-HG-XPOLLS-US.json"
  }
}
```

Command line flags take precedence over the file.

*/
