use boardsync::{BoardModel, PlayerPalette};
use chrono::{DateTime, Utc};
use proptest::prelude::*;

fn board_strategy() -> impl Strategy<Value = (u32, u32, String)> {
    (1u32..12, 1u32..12).prop_flat_map(|(width, height)| {
        let area = (width * height) as usize;
        let cell = prop_oneof![3 => Just('.'), 1 => prop::char::range('A', 'Z'), 1 => Just('/')];
        (
            Just(width),
            Just(height),
            prop::collection::vec(cell, area).prop_map(|cells| cells.into_iter().collect::<String>()),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn piece_count_matches_non_empty_cells((width, height, cells) in board_strategy()) {
        let board = BoardModel::decode(&cells, width, height, DateTime::<Utc>::UNIX_EPOCH, &PlayerPalette::new()).unwrap();
        prop_assert_eq!(board.occupied(), cells.chars().filter(|c| *c != '.').count());
        for piece in board.pieces() {
            prop_assert!(piece.x < width && piece.y < height);
        }
    }

    #[test]
    fn encode_decode_roundtrip((width, height, cells) in board_strategy(), start in 0i64..4_000_000_000_000) {
        let session_start = DateTime::<Utc>::from_timestamp_millis(start).unwrap();
        let palette = PlayerPalette::new();
        let board = BoardModel::decode(&cells, width, height, session_start, &palette).unwrap();
        prop_assert_eq!(board.to_cells(), cells);
        let again = BoardModel::decode(&board.to_cells(), width, height, session_start, &palette).unwrap();
        prop_assert_eq!(again, board);
    }

    #[test]
    fn wrong_length_never_decodes((width, height, cells) in board_strategy(), extra in 1usize..4) {
        let longer = format!("{}{}", cells, ".".repeat(extra));
        prop_assert!(BoardModel::decode(&longer, width, height, DateTime::<Utc>::UNIX_EPOCH, &PlayerPalette::new()).is_err());
    }
}
