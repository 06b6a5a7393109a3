use chrono::{DateTime, TimeZone, Utc};

/// Маска номера записи: младшие 48 бит ссылки на файл
pub const RECORD_NUMBER_MASK: u64 = 0xFFFF_FFFF_FFFF;

/// Конвертирует Windows FILETIME (100-нс интервалы с 1601-01-01) в DateTime<Utc>
pub fn filetime_to_datetime(filetime: u64) -> DateTime<Utc> {
    // 116444736000000000 = количество 100-нс интервалов между 1601-01-01 и 1970-01-01 (Unix Epoch)
    let unix_time_100ns = filetime.saturating_sub(116_444_736_000_000_000);
    let seconds = (unix_time_100ns / 10_000_000) as i64;
    let nanoseconds = ((unix_time_100ns % 10_000_000) * 100) as u32;

    Utc.timestamp_opt(seconds, nanoseconds)
        .single()
        .unwrap_or_default()
}

/// Номер записи из 64-битной ссылки (старшие 16 бит - sequence)
pub fn reference_record_number(reference: u64) -> u64 {
    reference & RECORD_NUMBER_MASK
}

/// Sequence number, закодированный в старших 16 битах ссылки
pub fn reference_sequence(reference: u64) -> u16 {
    (reference >> 48) as u16
}

/// Собирает ссылку обратно (нужно в основном для тестов и экспорта)
pub fn make_reference(record_number: u64, sequence: u16) -> u64 {
    (record_number & RECORD_NUMBER_MASK) | ((sequence as u64) << 48)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_split() {
        let reference = 0x0005_0000_0000_0005u64;
        assert_eq!(reference_record_number(reference), 5);
        assert_eq!(reference_sequence(reference), 5);

        let reference = make_reference(0x1234_5678_9ABC, 0xBEEF);
        assert_eq!(reference_record_number(reference), 0x1234_5678_9ABC);
        assert_eq!(reference_sequence(reference), 0xBEEF);
    }

    #[test]
    fn test_filetime_epoch() {
        assert_eq!(filetime_to_datetime(116_444_736_000_000_000).timestamp(), 0);
        // до 1970 - насыщаемся в эпоху
        assert_eq!(filetime_to_datetime(0).timestamp(), 0);

        let dt = filetime_to_datetime(116_444_736_000_000_000 + 10_000_000 * 60 + 5);
        assert_eq!(dt.timestamp(), 60);
        assert_eq!(dt.timestamp_subsec_nanos(), 500);
    }
}
